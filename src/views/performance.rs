use std::fmt::Write;

use tracing::warn;

use crate::analytics::{
    category_means, monthly_trend, record_average, star_histogram, strongest_category,
    CategoryMeans,
};
use crate::client::Backend;
use crate::models::{Category, Feedback};
use crate::notice::Notice;
use crate::scope::ViewScope;
use crate::session::SessionStore;

use super::{header, stars};

pub(super) fn write_categories(output: &mut String, means: &CategoryMeans) {
    let _ = writeln!(output, "## Category Breakdown");
    for category in Category::ALL {
        let value = means.get(category);
        let _ = writeln!(
            output,
            "- {:<20} {} {:.2}",
            category.label(),
            stars(value),
            value
        );
    }
    let _ = writeln!(
        output,
        "Strongest area: {}",
        strongest_category(means).label()
    );
    let _ = writeln!(output);
}

pub(super) fn write_distribution(output: &mut String, feedbacks: &[Feedback]) {
    let histogram = star_histogram(feedbacks);
    let _ = writeln!(output, "## Rating Distribution");
    for (bucket, count) in histogram.iter() {
        let _ = writeln!(
            output,
            "- {}: {} ({}%)",
            bucket.label(),
            count,
            histogram.share(bucket)
        );
    }
    let _ = writeln!(output);
}

pub(super) fn write_trend(output: &mut String, feedbacks: &[Feedback]) {
    let trend = monthly_trend(feedbacks);
    let _ = writeln!(output, "## Monthly Trend");
    if trend.is_empty() {
        let _ = writeln!(output, "No monthly data yet.");
    }
    for point in trend {
        let _ = writeln!(
            output,
            "- {}: {:.2} across {} responses",
            point.label, point.rating, point.responses
        );
    }
    let _ = writeln!(output);
}

pub async fn detail<B: Backend>(
    scope: &ViewScope,
    session: &SessionStore<B>,
    teacher_id: &str,
) -> Result<String, Notice> {
    let performance = scope
        .run(session.backend().teacher_performance(teacher_id))
        .await
        .map_err(|e| {
            warn!("Failed to load performance for {teacher_id}: {e}");
            Notice::error("Error", e.user_message("Failed to load teacher performance"))
        })?;

    let teacher = &performance.teacher;
    let subject = match (&teacher.subject_name, &teacher.subject_code) {
        (Some(name), Some(code)) => format!("{name} ({code})"),
        (Some(name), None) => name.clone(),
        (None, Some(code)) => code.clone(),
        (None, None) => String::new(),
    };

    let mut output = String::new();
    header(&mut output, &format!("Performance: {}", teacher.full_name), &subject);
    let _ = writeln!(
        output,
        "Overall: {} {:.2} from {} responses",
        stars(performance.overall_avg),
        performance.overall_avg,
        performance.feedbacks.len()
    );
    let _ = writeln!(output);

    if performance.feedbacks.is_empty() {
        let _ = writeln!(output, "No feedback yet.");
        return Ok(output);
    }

    write_categories(&mut output, &category_means(&performance.feedbacks));
    write_distribution(&mut output, &performance.feedbacks);
    write_trend(&mut output, &performance.feedbacks);

    let _ = writeln!(output, "## Individual Feedback");
    for fb in &performance.feedbacks {
        let student = fb
            .student
            .as_ref()
            .map(|s| s.full_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("Anonymous");
        let avg = record_average(&fb.ratings);
        let _ = writeln!(
            output,
            "- {} on {}: {} {:.1}",
            student,
            fb.created_at.format("%B %-d, %Y"),
            stars(avg),
            avg
        );
        if let Some(comment) = &fb.comment {
            let _ = writeln!(output, "  \"{comment}\"");
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::{Ratings, Role, StudentRef, UserRecord};
    use crate::session::tests::{user, FakeBackend};

    fn feedback(value: u8, month: u32, comment: Option<&str>) -> Feedback {
        Feedback {
            id: format!("fb-{value}-{month}"),
            student: Some(StudentRef {
                id: format!("s{value}"),
                full_name: format!("Student {value}"),
            }),
            teacher_id: "t1".to_string(),
            ratings: Ratings::uniform(value),
            comment: comment.map(str::to_string),
            created_at: Utc.with_ymd_and_hms(2026, month, 3, 9, 0, 0).unwrap(),
        }
    }

    async fn admin_session(feedbacks: Vec<Feedback>) -> SessionStore<FakeBackend> {
        let backend = FakeBackend {
            users: vec![UserRecord {
                id: "t1".to_string(),
                full_name: "Mr Rao".to_string(),
                role: "Teacher".to_string(),
                subject_name: Some("Physics".to_string()),
                subject_code: Some("PHY1".to_string()),
            }],
            feedbacks: RefCell::new(feedbacks),
            ..FakeBackend::default()
        }
        .with_account("A01", "adminpw", user("A01", "Root", Role::Admin));
        let mut session = SessionStore::new(backend);
        session.login("A01", "adminpw").await.unwrap();
        session
    }

    #[tokio::test]
    async fn detail_renders_three_tier_teacher() {
        let session = admin_session(vec![
            feedback(5, 1, Some("Great labs")),
            feedback(4, 2, None),
            feedback(3, 3, None),
        ])
        .await;
        let scope = ViewScope::mount(Duration::from_secs(1));

        let body = detail(&scope, &session, "t1").await.unwrap();

        assert!(body.contains("# Performance: Mr Rao"));
        assert!(body.contains("Physics (PHY1)"));
        assert!(body.contains("Overall: ★★★★☆ 4.00 from 3 responses"));
        assert!(body.contains("- 5 Stars: 1 (33%)"));
        assert!(body.contains("- 4 Stars: 1"));
        assert!(body.contains("- 3 Stars: 1"));
        assert!(body.contains("- 2 Stars: 0"));
        assert!(body.contains("- 1 Star: 0"));
        assert!(body.contains("- Jan: 5.00 across 1 responses"));
        assert!(body.contains("Student 5 on January 3, 2026"));
        assert!(body.contains("\"Great labs\""));
    }

    #[tokio::test]
    async fn detail_without_feedback_shows_placeholder() {
        let session = admin_session(Vec::new()).await;
        let scope = ViewScope::mount(Duration::from_secs(1));

        let body = detail(&scope, &session, "t1").await.unwrap();
        assert!(body.contains("Overall: ☆☆☆☆☆ 0.00 from 0 responses"));
        assert!(body.contains("No feedback yet."));
    }

    #[tokio::test]
    async fn unknown_teacher_surfaces_remote_message() {
        let session = admin_session(Vec::new()).await;
        let scope = ViewScope::mount(Duration::from_secs(1));

        let notice = detail(&scope, &session, "missing").await.unwrap_err();
        assert_eq!(notice.description, "Teacher not found");
    }
}
