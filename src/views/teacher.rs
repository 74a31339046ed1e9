use std::fmt::Write;

use tracing::warn;

use crate::analytics::{category_means, monthly_volume, overall_average, round2, PerformanceLevel};
use crate::client::Backend;
use crate::models::Feedback;
use crate::notice::Notice;
use crate::scope::ViewScope;
use crate::session::SessionStore;

use super::performance::{write_categories, write_distribution, write_trend};
use super::{header, stars};

const RECENT_COMMENTS: usize = 5;
const VOLUME_BAR_WIDTH: usize = 20;

fn write_volume(output: &mut String, feedbacks: &[Feedback]) {
    let volume = monthly_volume(feedbacks);
    let peak = volume.iter().map(|(_, count)| *count).max().unwrap_or(0);

    let _ = writeln!(output, "## Monthly Responses");
    for (label, count) in &volume {
        let width = if peak == 0 {
            0
        } else {
            (count * VOLUME_BAR_WIDTH).div_ceil(peak)
        };
        let _ = writeln!(output, "- {:<8} {} {}", label, "█".repeat(width), count);
    }
    let _ = writeln!(output);
}

pub async fn dashboard<B: Backend>(
    scope: &ViewScope,
    session: &SessionStore<B>,
) -> Result<String, Notice> {
    let mut feedbacks = scope
        .run(session.backend().own_feedback())
        .await
        .map_err(|e| {
            warn!("Failed to load own feedback: {e}");
            Notice::error("Error", e.user_message("Failed to load feedback"))
        })?;

    let name = session.user().map(|u| u.full_name.as_str()).unwrap_or("Teacher");
    let overall = round2(overall_average(&feedbacks));

    let mut output = String::new();
    header(&mut output, "Teacher Dashboard", &format!("Welcome, {name}"));
    let _ = writeln!(
        output,
        "Overall rating: {} {:.2} ({})",
        stars(overall),
        overall,
        PerformanceLevel::for_average(overall)
    );
    let _ = writeln!(output, "Total responses: {}", feedbacks.len());
    let _ = writeln!(output);

    if feedbacks.is_empty() {
        let _ = writeln!(output, "No feedback yet.");
        return Ok(output);
    }

    write_categories(&mut output, &category_means(&feedbacks));
    write_distribution(&mut output, &feedbacks);
    write_trend(&mut output, &feedbacks);
    write_volume(&mut output, &feedbacks);

    feedbacks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let _ = writeln!(output, "## Recent Comments");
    let comments: Vec<_> = feedbacks
        .iter()
        .filter_map(|fb| fb.comment.as_ref().map(|c| (fb, c)))
        .take(RECENT_COMMENTS)
        .collect();
    if comments.is_empty() {
        let _ = writeln!(output, "No comments yet.");
    }
    for (fb, comment) in comments {
        let _ = writeln!(output, "- {}: \"{}\"", fb.created_at.format("%b %-d"), comment);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::{Ratings, Role};
    use crate::session::tests::{user, FakeBackend};

    fn feedback(teacher_id: &str, values: [u8; 5], day: u32, comment: Option<&str>) -> Feedback {
        Feedback {
            id: format!("fb-{day}"),
            student: None,
            teacher_id: teacher_id.to_string(),
            ratings: Ratings::from_array(values),
            comment: comment.map(str::to_string),
            created_at: Utc.with_ymd_and_hms(2026, 5, day, 8, 0, 0).unwrap(),
        }
    }

    async fn teacher_session(feedbacks: Vec<Feedback>) -> SessionStore<FakeBackend> {
        let backend = FakeBackend {
            feedbacks: RefCell::new(feedbacks),
            ..FakeBackend::default()
        }
        .with_account("T01", "teachpw", user("T01", "Mr Rao", Role::Teacher));
        let mut session = SessionStore::new(backend);
        session.login("T01", "teachpw").await.unwrap();
        session
    }

    #[tokio::test]
    async fn dashboard_shows_only_own_feedback() {
        let session = teacher_session(vec![
            feedback("T01", [5, 5, 4, 4, 5], 1, Some("Clear")),
            feedback("T01", [3, 4, 3, 4, 3], 9, Some("Too fast")),
            feedback("T02", [1, 1, 1, 1, 1], 4, Some("Not mine")),
        ])
        .await;
        let scope = ViewScope::mount(Duration::from_secs(1));

        let body = dashboard(&scope, &session).await.unwrap();

        assert!(body.contains("Welcome, Mr Rao"));
        assert!(body.contains("Total responses: 2"));
        assert!(body.contains("Overall rating: ★★★★☆ 4.00 (Excellent)"));
        assert!(body.contains("Strongest area: Subject Clarity"));
        assert!(body.contains("- May: 4.00 across 2 responses"));
        assert!(body.contains("## Monthly Responses"));
        assert!(body.contains(&format!("- May      {} 2", "█".repeat(20))));
        assert!(!body.contains("Not mine"));
        let newest = body.find("Too fast").unwrap();
        let oldest = body.find("Clear").unwrap();
        assert!(newest < oldest);
    }

    #[tokio::test]
    async fn dashboard_without_feedback() {
        let session = teacher_session(Vec::new()).await;
        let scope = ViewScope::mount(Duration::from_secs(1));

        let body = dashboard(&scope, &session).await.unwrap();
        assert!(body.contains("Overall rating: ☆☆☆☆☆ 0.00 (Needs Improvement)"));
        assert!(body.contains("No feedback yet."));
    }
}
