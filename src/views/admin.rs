use std::fmt::Write;

use tracing::warn;

use crate::analytics::{department_average, response_share, teacher_stats, PerformanceLevel};
use crate::client::Backend;
use crate::models::{Role, UserRecord};
use crate::notice::Notice;
use crate::router::Route;
use crate::scope::ViewScope;
use crate::session::SessionStore;

use super::{header, stars};

pub async fn dashboard<B: Backend>(
    scope: &ViewScope,
    session: &SessionStore<B>,
    notices: &mut Vec<Notice>,
) -> Result<String, Notice> {
    let name = session.user().map(|u| u.full_name.as_str()).unwrap_or("Admin");

    let mut output = String::new();
    header(&mut output, "Admin Dashboard", &format!("Welcome, {name}"));

    match scope.run(session.backend().list_users()).await {
        Ok(users) => {
            let count = |role: Role| users.iter().filter(|u| u.role == role.as_str()).count();
            let _ = writeln!(output, "Users: {}", users.len());
            let _ = writeln!(output, "Teachers: {}", count(Role::Teacher));
            let _ = writeln!(output, "Students: {}", count(Role::Student));
            let _ = writeln!(output, "Admins: {}", count(Role::Admin));
        }
        Err(e) => {
            warn!("Failed to load user counts: {e}");
            notices.push(Notice::warning("Stats", e.user_message("User counts unavailable")));
        }
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Actions");
    let _ = writeln!(output, "- Register a new user: {}", Route::RegisterUser);
    let _ = writeln!(output, "- Review teacher performance: {}", Route::Performance);
    Ok(output)
}

pub async fn overview<B: Backend>(
    scope: &ViewScope,
    session: &SessionStore<B>,
) -> Result<String, Notice> {
    let load_failed = |e: crate::error::ApiError| {
        warn!("Failed to load performance data: {e}");
        Notice::error("Error", "Failed to load performance data")
    };
    let users = scope
        .run(session.backend().list_users())
        .await
        .map_err(load_failed)?;
    let feedbacks = scope
        .run(session.backend().all_feedback())
        .await
        .map_err(load_failed)?;

    let teachers: Vec<UserRecord> = users.into_iter().filter(UserRecord::is_teacher).collect();
    let department = department_average(teachers.iter().map(|t| t.id.as_str()), &feedbacks);

    let mut output = String::new();
    header(&mut output, "Teacher Performance", "Feedback across all teachers");
    let _ = writeln!(output, "Teachers: {}", teachers.len());
    let _ = writeln!(output, "Total feedback: {}", feedbacks.len());
    let _ = writeln!(output, "Average rating: {department:.1}");
    let _ = writeln!(output);

    if teachers.is_empty() {
        let _ = writeln!(output, "No teachers found.");
        return Ok(output);
    }

    let _ = writeln!(output, "## Teachers");
    for teacher in &teachers {
        let stats = teacher_stats(&teacher.id, &feedbacks);
        let subject = teacher.subject_name.as_deref().unwrap_or("No subject");
        let _ = writeln!(
            output,
            "- {} ({}): {} {:.2} {} | {} responses | {}% of feedback | score {}% | {}",
            teacher.full_name,
            subject,
            stars(stats.avg),
            stats.avg,
            PerformanceLevel::for_average(stats.avg),
            stats.total,
            response_share(&stats, feedbacks.len()),
            ((stats.avg / 5.0) * 100.0).round() as u32,
            Route::ShowPerformance {
                teacher_id: teacher.id.clone()
            }
        );
    }

    Ok(output)
}
