//! Text renderings of every screen reachable through the router.
//!
//! A view fetches what it needs inside its own [`ViewScope`], computes the
//! aggregates locally, and returns the rendered body. Any failure is turned
//! into a [`Notice`] plus a placeholder body, so one broken view never ends
//! the session.

use std::fmt::Write;
use std::time::Duration;

use tracing::warn;

use crate::client::Backend;
use crate::notice::Notice;
use crate::router::Route;
use crate::scope::ViewScope;
use crate::session::SessionStore;

mod admin;
mod performance;
mod pages;
mod student;
mod teacher;

pub use student::{feedback_form, rate_teacher, teacher_name};

#[derive(Debug, Clone)]
pub struct Rendered {
    pub route: Route,
    pub body: String,
    pub notices: Vec<Notice>,
}

/// Options a view may honour while mounting.
#[derive(Debug, Clone, Default)]
pub struct MountOptions {
    pub search: Option<String>,
}

pub async fn mount<B: Backend>(
    route: &Route,
    session: &SessionStore<B>,
    limit: Duration,
    options: &MountOptions,
) -> Rendered {
    let scope = ViewScope::mount(limit);
    let mut notices = Vec::new();

    let result = match route {
        Route::Landing => Ok(pages::landing()),
        Route::Login => Ok(pages::login()),
        Route::RegisterUser => Ok(pages::register()),
        Route::StudentDashboard => {
            student::dashboard(&scope, session, options.search.as_deref(), &mut notices).await
        }
        Route::TeacherDashboard => teacher::dashboard(&scope, session).await,
        Route::AdminDashboard => admin::dashboard(&scope, session, &mut notices).await,
        Route::Performance => admin::overview(&scope, session).await,
        Route::ShowPerformance { teacher_id } => {
            performance::detail(&scope, session, teacher_id).await
        }
    };

    let body = match result {
        Ok(body) => body,
        Err(notice) => {
            warn!("View {route} failed: {notice}");
            let body = placeholder(&notice.description);
            notices.push(notice);
            body
        }
    };

    Rendered {
        route: route.clone(),
        body,
        notices,
    }
}

pub fn loading() -> String {
    "Loading...\n".to_string()
}

fn placeholder(message: &str) -> String {
    format!("(nothing to show: {message})\n")
}

/// Five-star bar for an average rating, rounded to the nearest star.
pub(crate) fn stars(rating: f64) -> String {
    let filled = rating.round().clamp(0.0, 5.0) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

pub(crate) fn header(output: &mut String, title: &str, subtitle: &str) {
    let _ = writeln!(output, "# {title}");
    if !subtitle.is_empty() {
        let _ = writeln!(output, "{subtitle}");
    }
    let _ = writeln!(output);
}
