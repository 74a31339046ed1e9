use std::fmt;

use tracing::{info, warn};

use crate::client::Backend;
use crate::models::{FeedbackSubmission, Ratings, RegisterRequest, Role};
use crate::notice::Notice;

const MIN_NAME_CHARS: usize = 2;
const MIN_ENROLLMENT_CHARS: usize = 3;
const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Raw registration input as typed by an administrator.
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub full_name: String,
    pub enrollment_number: String,
    pub password: String,
    pub role: String,
    pub subject_name: Option<String>,
    pub subject_code: Option<String>,
}

impl RegisterForm {
    /// Subject fields are only carried for teachers and are not required.
    pub fn validate(&self) -> Result<RegisterRequest, Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.full_name.chars().count() < MIN_NAME_CHARS {
            errors.push(FieldError {
                field: "full_name",
                message: "Full Name must be at least 2 characters".to_string(),
            });
        }
        if self.enrollment_number.chars().count() < MIN_ENROLLMENT_CHARS {
            errors.push(FieldError {
                field: "enrollment_number",
                message: "Enrollment Number must be at least 3 characters".to_string(),
            });
        }
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            errors.push(FieldError {
                field: "password",
                message: "Password must be at least 6 characters".to_string(),
            });
        }
        let role = match self.role.parse::<Role>() {
            Ok(role) => Some(role),
            Err(_) => {
                errors.push(FieldError {
                    field: "role",
                    message: "Role is required".to_string(),
                });
                None
            }
        };

        match role {
            Some(role) if errors.is_empty() => {
                let teacher = role == Role::Teacher;
                Ok(RegisterRequest {
                    full_name: self.full_name.clone(),
                    enrollment_number: self.enrollment_number.clone(),
                    password: self.password.clone(),
                    role,
                    subject_name: self.subject_name.clone().filter(|_| teacher),
                    subject_code: self.subject_code.clone().filter(|_| teacher),
                })
            }
            _ => Err(errors),
        }
    }
}

pub async fn submit_registration<B: Backend>(backend: &B, request: &RegisterRequest) -> Notice {
    match backend.register(request).await {
        Ok(message) => {
            info!("Registered {} as {}", request.enrollment_number, request.role);
            Notice::success(
                "Registration",
                message.unwrap_or_else(|| "Registration successful!".to_string()),
            )
        }
        Err(e) => {
            warn!("Registration failed: {e}");
            Notice::error("Registration", e.user_message("Something went wrong"))
        }
    }
}

/// A student's answers for one teacher; unanswered categories are `None`.
#[derive(Debug, Clone, Default)]
pub struct FeedbackForm {
    pub teacher_id: String,
    pub ratings: [Option<u8>; 5],
    pub comment: String,
}

impl FeedbackForm {
    pub fn new(teacher_id: impl Into<String>) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            ..Self::default()
        }
    }

    pub fn with_ratings(mut self, values: &[u8]) -> Self {
        for (slot, value) in self.ratings.iter_mut().zip(values) {
            *slot = Some(*value);
        }
        self
    }

    pub fn validate(&self) -> Result<FeedbackSubmission, Notice> {
        let mut values = [0u8; 5];
        for (value, rating) in values.iter_mut().zip(self.ratings) {
            match rating {
                Some(r @ 1..=5) => *value = r,
                _ => {
                    return Err(Notice::error(
                        "Incomplete Feedback",
                        "Please rate all aspects before submitting.",
                    ))
                }
            }
        }

        Ok(FeedbackSubmission {
            teacher_id: self.teacher_id.clone(),
            ratings: Ratings::from_array(values),
            comments: self.comment.trim().to_string(),
        })
    }
}

pub async fn submit_feedback<B: Backend>(
    backend: &B,
    teacher_name: &str,
    submission: &FeedbackSubmission,
) -> Result<Notice, Notice> {
    match backend.submit_feedback(submission).await {
        Ok(()) => {
            info!("Feedback submitted for teacher {}", submission.teacher_id);
            Ok(Notice::success(
                "Feedback Submitted!",
                format!("Thank you for your feedback about {teacher_name}."),
            ))
        }
        Err(e) => {
            warn!("Feedback submission failed: {e}");
            Err(Notice::error(
                "Submission Failed",
                e.user_message("Failed to submit feedback. Please try again."),
            ))
        }
    }
}

/// Parses `"5,4,3,2,1"` into five ratings.
pub fn parse_ratings(raw: &str) -> Result<Vec<u8>, String> {
    let values = raw
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<u8>()
                .map_err(|e| format!("invalid rating '{}': {e}", part.trim()))
        })
        .collect::<Result<Vec<u8>, String>>()?;
    if values.len() != 5 {
        return Err(format!("expected 5 ratings, got {}", values.len()));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::FakeBackend;

    fn form(name: &str, id: &str, password: &str, role: &str) -> RegisterForm {
        RegisterForm {
            full_name: name.to_string(),
            enrollment_number: id.to_string(),
            password: password.to_string(),
            role: role.to_string(),
            subject_name: Some("Physics".to_string()),
            subject_code: Some("PHY1".to_string()),
        }
    }

    fn fields(errors: Vec<FieldError>) -> Vec<&'static str> {
        errors.into_iter().map(|e| e.field).collect()
    }

    #[test]
    fn rejects_values_one_below_minimum() {
        let errors = form("A", "E0", "12345", "Student").validate().unwrap_err();
        assert_eq!(fields(errors), vec!["full_name", "enrollment_number", "password"]);
    }

    #[test]
    fn accepts_values_at_minimum() {
        let request = form("As", "E01", "123456", "Student").validate().unwrap();
        assert_eq!(request.role, Role::Student);
        assert_eq!(request.subject_name, None);
    }

    #[test]
    fn rejects_missing_role() {
        let errors = form("Asha", "E001", "secret1", "").validate().unwrap_err();
        assert_eq!(fields(errors), vec!["role"]);
    }

    #[test]
    fn teacher_keeps_subject_fields_but_does_not_require_them() {
        let request = form("Mr Rao", "T001", "secret1", "Teacher").validate().unwrap();
        assert_eq!(request.subject_code.as_deref(), Some("PHY1"));

        let mut bare = form("Mr Rao", "T001", "secret1", "Teacher");
        bare.subject_name = None;
        bare.subject_code = None;
        assert!(bare.validate().is_ok());
    }

    #[test]
    fn feedback_requires_every_category() {
        let partial = FeedbackForm::new("t1").with_ratings(&[5, 4, 3, 2]);
        assert_eq!(partial.validate().unwrap_err().title, "Incomplete Feedback");

        let out_of_range = FeedbackForm::new("t1").with_ratings(&[5, 4, 3, 2, 6]);
        assert!(out_of_range.validate().is_err());

        let mut complete = FeedbackForm::new("t1").with_ratings(&[5, 4, 3, 2, 1]);
        complete.comment = "  clear lectures ".to_string();
        let submission = complete.validate().unwrap();
        assert_eq!(submission.ratings.sum(), 15);
        assert_eq!(submission.comments, "clear lectures");
    }

    #[test]
    fn parses_comma_separated_ratings() {
        assert_eq!(parse_ratings("5, 4,3,2 ,1").unwrap(), vec![5, 4, 3, 2, 1]);
        assert!(parse_ratings("5,4,3").is_err());
        assert!(parse_ratings("5,4,x,2,1").is_err());
    }

    #[tokio::test]
    async fn registration_reports_server_messages() {
        let backend = FakeBackend::default();
        let request = form("Asha", "E001", "secret1", "Student").validate().unwrap();

        let first = submit_registration(&backend, &request).await;
        assert_eq!(first.description, "User registered successfully");

        let second = submit_registration(&backend, &request).await;
        assert_eq!(second.description, "User already exists");
    }
}
