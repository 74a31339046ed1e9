use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Teacher, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Teacher => "Teacher",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown role: {s}"))
    }
}

/// The authenticated identity returned by the session check and by login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "FullName")]
    pub full_name: String,
    #[serde(rename = "EndrollmentNumber", default)]
    pub enrollment_number: String,
    pub role: Role,
}

/// An entry of the general user list. The role is kept as the raw string so
/// that a record with an unexpected role does not fail the whole list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "FullName")]
    pub full_name: String,
    #[serde(default)]
    pub role: String,
    #[serde(rename = "SubjectName", default)]
    pub subject_name: Option<String>,
    #[serde(rename = "SubjectCode", default)]
    pub subject_code: Option<String>,
}

impl UserRecord {
    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    TeachingQuality,
    SubjectClarity,
    Interaction,
    Preparation,
    Punctuality,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::TeachingQuality,
        Category::SubjectClarity,
        Category::Interaction,
        Category::Preparation,
        Category::Punctuality,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::TeachingQuality => "Teaching Quality",
            Category::SubjectClarity => "Subject Clarity",
            Category::Interaction => "Student Interaction",
            Category::Preparation => "Class Preparation",
            Category::Punctuality => "Punctuality",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ratings {
    pub teaching_quality: u8,
    pub subject_clarity: u8,
    pub interaction: u8,
    pub preparation: u8,
    pub punctuality: u8,
}

impl Ratings {
    #[cfg(test)]
    pub fn uniform(value: u8) -> Self {
        Self::from_array([value; 5])
    }

    pub fn from_array(values: [u8; 5]) -> Self {
        Self {
            teaching_quality: values[0],
            subject_clarity: values[1],
            interaction: values[2],
            preparation: values[3],
            punctuality: values[4],
        }
    }

    pub fn get(&self, category: Category) -> u8 {
        match category {
            Category::TeachingQuality => self.teaching_quality,
            Category::SubjectClarity => self.subject_clarity,
            Category::Interaction => self.interaction,
            Category::Preparation => self.preparation,
            Category::Punctuality => self.punctuality,
        }
    }

    pub fn sum(&self) -> u32 {
        Category::ALL.iter().map(|c| self.get(*c) as u32).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StudentRef {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "FullName", default)]
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub id: String,
    pub student: Option<StudentRef>,
    pub teacher_id: String,
    pub ratings: Ratings,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

// The remote API sometimes populates `teacherId` / `studentId` with the
// referenced document and sometimes leaves the bare id.
#[derive(Deserialize)]
#[serde(untagged)]
enum Reference<T> {
    Id(String),
    Populated(T),
}

#[derive(Deserialize)]
struct IdOnly {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Deserialize)]
struct FeedbackWire {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "studentId", default)]
    student: Option<Reference<StudentRef>>,
    #[serde(rename = "teacherId")]
    teacher: Reference<IdOnly>,
    ratings: Ratings,
    #[serde(default)]
    comments: Option<String>,
    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,
}

impl<'de> Deserialize<'de> for Feedback {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = FeedbackWire::deserialize(deserializer)?;
        let student = wire.student.map(|reference| match reference {
            Reference::Id(id) => StudentRef {
                id,
                full_name: String::new(),
            },
            Reference::Populated(student) => student,
        });
        let teacher_id = match wire.teacher {
            Reference::Id(id) => id,
            Reference::Populated(teacher) => teacher.id,
        };

        Ok(Feedback {
            id: wire.id,
            student,
            teacher_id,
            ratings: wire.ratings,
            comment: wire.comments.filter(|c| !c.trim().is_empty()),
            created_at: wire.created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TeacherProfile {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "FullName")]
    pub full_name: String,
    #[serde(rename = "SubjectName", default)]
    pub subject_name: Option<String>,
    #[serde(rename = "SubjectCode", default)]
    pub subject_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeacherPerformance {
    pub teacher: TeacherProfile,
    pub feedbacks: Vec<Feedback>,
    pub overall_avg: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    #[serde(rename = "EndrollmentNumber")]
    pub enrollment_number: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterRequest {
    #[serde(rename = "FullName")]
    pub full_name: String,
    #[serde(rename = "EndrollmentNumber")]
    pub enrollment_number: String,
    pub password: String,
    pub role: Role,
    #[serde(rename = "SubjectName", skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    #[serde(rename = "SubjectCode", skip_serializing_if = "Option::is_none")]
    pub subject_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackSubmission {
    #[serde(rename = "teacherId")]
    pub teacher_id: String,
    pub ratings: Ratings,
    pub comments: String,
}
