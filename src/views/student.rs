use std::fmt::Write;

use tracing::{debug, warn};

use crate::analytics::{completion_rate, matches_search, record_average};
use crate::client::Backend;
use crate::error::ApiError;
use crate::forms::{submit_feedback, FeedbackForm};
use crate::models::{Category, Feedback, UserRecord};
use crate::notice::{Notice, Severity};
use crate::scope::ViewScope;
use crate::session::SessionStore;

use super::{header, stars};

struct TeacherRow {
    teacher: UserRecord,
    own_rating: Option<f64>,
}

async fn load_rows<B: Backend>(
    scope: &ViewScope,
    session: &SessionStore<B>,
) -> Result<Vec<TeacherRow>, Notice> {
    let users = scope
        .run(session.backend().list_users())
        .await
        .map_err(|e| {
            warn!("Failed to load teachers: {e}");
            Notice::error("Error", "Failed to load data")
        })?;

    // Older deployments lack this endpoint; without it nothing is marked rated.
    let submitted: Vec<Feedback> = match scope.run(session.backend().submitted_feedback()).await {
        Ok(feedbacks) => feedbacks,
        Err(e) => {
            debug!("Submitted feedback unavailable: {e}");
            Vec::new()
        }
    };

    Ok(users
        .into_iter()
        .filter(UserRecord::is_teacher)
        .map(|teacher| {
            let own_rating = submitted
                .iter()
                .find(|fb| fb.teacher_id == teacher.id)
                .map(|fb| record_average(&fb.ratings));
            TeacherRow {
                teacher,
                own_rating,
            }
        })
        .collect())
}

pub async fn dashboard<B: Backend>(
    scope: &ViewScope,
    session: &SessionStore<B>,
    search: Option<&str>,
    notices: &mut Vec<Notice>,
) -> Result<String, Notice> {
    let rows = load_rows(scope, session).await?;
    let name = session.user().map(|u| u.full_name.as_str()).unwrap_or("Unknown");

    let submitted = rows.iter().filter(|row| row.own_rating.is_some()).count();
    let total = rows.len();

    let mut output = String::new();
    header(&mut output, "Student Dashboard", &format!("Welcome back, {name}"));
    let _ = writeln!(output, "Teachers: {total}");
    let _ = writeln!(output, "Feedback given: {submitted}");
    let _ = writeln!(output, "Pending: {}", total - submitted);
    let _ = writeln!(output, "Completion: {}%", completion_rate(submitted, total));
    let _ = writeln!(output);

    if rows.is_empty() {
        let _ = writeln!(output, "No teachers found.");
        return Ok(output);
    }

    let term = search.unwrap_or_default();
    let visible: Vec<&TeacherRow> = rows
        .iter()
        .filter(|row| {
            matches_search(
                term,
                &row.teacher.full_name,
                row.teacher.subject_name.as_deref(),
                row.teacher.subject_code.as_deref(),
            )
        })
        .collect();

    let _ = writeln!(output, "## Teachers");
    if visible.is_empty() {
        let _ = writeln!(output, "No teachers match \"{}\".", term.trim());
        notices.push(Notice::new(
            Severity::Info,
            "Search",
            "Try a different name, subject, or code",
        ));
        return Ok(output);
    }

    for row in visible {
        let subject = match (&row.teacher.subject_name, &row.teacher.subject_code) {
            (Some(name), Some(code)) => format!("{name} ({code})"),
            (Some(name), None) => name.clone(),
            (None, Some(code)) => code.clone(),
            (None, None) => "No subject".to_string(),
        };
        let status = match row.own_rating {
            Some(avg) => format!("rated {} {:.2}", stars(avg), avg),
            None => format!("pending, rate with: rate {} <5 ratings>", row.teacher.id),
        };
        let _ = writeln!(
            output,
            "- {} [{}] {}: {}",
            row.teacher.full_name, row.teacher.id, subject, status
        );
    }

    Ok(output)
}

pub fn feedback_form(teacher_name: &str) -> String {
    let mut output = String::new();
    header(
        &mut output,
        &format!("Feedback for {teacher_name}"),
        "Rate each aspect from 1 to 5. A comment is optional.",
    );
    for (index, category) in Category::ALL.iter().enumerate() {
        let _ = writeln!(output, "{}. {}", index + 1, category.label());
    }
    output
}

/// Name of the teacher with `teacher_id`, for the feedback form header.
pub async fn teacher_name<B: Backend>(
    scope: &ViewScope,
    session: &SessionStore<B>,
    teacher_id: &str,
) -> Result<String, Notice> {
    let users = scope
        .run(session.backend().list_users())
        .await
        .map_err(|e| {
            warn!("Failed to load teachers: {e}");
            Notice::error("Error", "Failed to load data")
        })?;

    users
        .into_iter()
        .find(|user| user.is_teacher() && user.id == teacher_id)
        .map(|teacher| teacher.full_name)
        .ok_or_else(|| {
            Notice::error("Unknown Teacher", format!("No teacher with id {teacher_id}"))
        })
}

/// Validates and submits one rating. Teachers the student already rated are
/// refused locally before any request is sent.
pub async fn rate_teacher<B: Backend>(
    scope: &ViewScope,
    session: &SessionStore<B>,
    form: &FeedbackForm,
) -> Result<Notice, Notice> {
    let submission = form.validate()?;
    let rows = load_rows(scope, session).await?;

    let row = rows
        .iter()
        .find(|row| row.teacher.id == submission.teacher_id)
        .ok_or_else(|| {
            Notice::error(
                "Unknown Teacher",
                format!("No teacher with id {}", submission.teacher_id),
            )
        })?;
    if row.own_rating.is_some() {
        return Err(Notice::warning(
            "Already Submitted",
            format!("You have already rated {}.", row.teacher.full_name),
        ));
    }

    scope
        .run(async {
            Ok::<_, ApiError>(
                submit_feedback(session.backend(), &row.teacher.full_name, &submission).await,
            )
        })
        .await
        .map_err(|e| Notice::error("Submission Failed", e.user_message("Request did not complete")))?
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::models::{Ratings, Role, StudentRef};
    use crate::session::tests::{user, FakeBackend};

    fn teacher(id: &str, name: &str, subject: Option<&str>) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            full_name: name.to_string(),
            role: "Teacher".to_string(),
            subject_name: subject.map(str::to_string),
            subject_code: None,
        }
    }

    fn submitted(teacher_id: &str, value: u8) -> Feedback {
        Feedback {
            id: format!("fb-{teacher_id}"),
            student: Some(StudentRef {
                id: "E001".to_string(),
                full_name: "Asha".to_string(),
            }),
            teacher_id: teacher_id.to_string(),
            ratings: Ratings::uniform(value),
            comment: None,
            created_at: Utc::now(),
        }
    }

    async fn student_session(backend: FakeBackend) -> SessionStore<FakeBackend> {
        let mut session = SessionStore::new(backend.with_account(
            "E001",
            "secret1",
            user("E001", "Asha", Role::Student),
        ));
        session.login("E001", "secret1").await.unwrap();
        session
    }

    fn backend() -> FakeBackend {
        FakeBackend {
            users: vec![
                teacher("t1", "Mr Rao", Some("Physics")),
                teacher("t2", "Ms Iyer", Some("Chemistry")),
                UserRecord {
                    role: "Student".to_string(),
                    ..teacher("s1", "Other Student", None)
                },
            ],
            submitted: vec![submitted("t1", 4)],
            ..FakeBackend::default()
        }
    }

    #[tokio::test]
    async fn dashboard_marks_rated_teachers_with_own_average() {
        let session = student_session(backend()).await;
        let scope = ViewScope::mount(Duration::from_secs(1));
        let mut notices = Vec::new();

        let body = dashboard(&scope, &session, None, &mut notices).await.unwrap();

        assert!(body.contains("Welcome back, Asha"));
        assert!(body.contains("Teachers: 2"));
        assert!(body.contains("Completion: 50%"));
        assert!(body.contains("Mr Rao [t1] Physics: rated ★★★★☆ 4.00"));
        assert!(body.contains("Ms Iyer [t2] Chemistry: pending"));
        assert!(!body.contains("Other Student"));
        assert!(notices.is_empty());
    }

    #[tokio::test]
    async fn dashboard_search_without_matches() {
        let session = student_session(backend()).await;
        let scope = ViewScope::mount(Duration::from_secs(1));
        let mut notices = Vec::new();

        let body = dashboard(&scope, &session, Some("biology"), &mut notices)
            .await
            .unwrap();

        assert!(body.contains("No teachers match \"biology\"."));
        assert_eq!(notices.len(), 1);
    }

    #[tokio::test]
    async fn rating_an_already_rated_teacher_is_refused() {
        let session = student_session(backend()).await;
        let scope = ViewScope::mount(Duration::from_secs(1));
        let form = FeedbackForm::new("t1").with_ratings(&[5, 5, 5, 5, 5]);

        let notice = rate_teacher(&scope, &session, &form).await.unwrap_err();
        assert_eq!(notice.title, "Already Submitted");
        assert!(session.backend().feedbacks.borrow().is_empty());
    }

    #[tokio::test]
    async fn rating_a_pending_teacher_submits() {
        let session = student_session(backend()).await;
        let scope = ViewScope::mount(Duration::from_secs(1));
        let form = FeedbackForm::new("t2").with_ratings(&[5, 4, 5, 4, 5]);

        let notice = rate_teacher(&scope, &session, &form).await.unwrap();
        assert_eq!(notice.title, "Feedback Submitted!");
        assert!(notice.description.contains("Ms Iyer"));
        assert_eq!(session.backend().feedbacks.borrow().len(), 1);
    }
}
