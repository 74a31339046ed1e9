use std::fmt;

use crate::models::Role;
use crate::session::SessionState;

pub const ROOT_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
const MAX_REDIRECTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    StudentDashboard,
    TeacherDashboard,
    AdminDashboard,
    RegisterUser,
    Performance,
    ShowPerformance { teacher_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Only(Role),
}

/// What the shell should do for a requested path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Loading,
    Mount(Route),
    Redirect(String),
}

impl Route {
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let route = match trimmed {
            "" => Route::Landing,
            "/login" => Route::Login,
            "/student-dashboard" => Route::StudentDashboard,
            "/teacher-dashboard" => Route::TeacherDashboard,
            "/admin-dashboard" => Route::AdminDashboard,
            "/register-new" => Route::RegisterUser,
            "/performance" => Route::Performance,
            other => {
                let teacher_id = other.strip_prefix("/showPerformance/")?;
                if teacher_id.is_empty() || teacher_id.contains('/') {
                    return None;
                }
                Route::ShowPerformance {
                    teacher_id: teacher_id.to_string(),
                }
            }
        };
        Some(route)
    }

    pub fn path(&self) -> String {
        match self {
            Route::Landing => ROOT_PATH.to_string(),
            Route::Login => LOGIN_PATH.to_string(),
            Route::StudentDashboard => "/student-dashboard".to_string(),
            Route::TeacherDashboard => "/teacher-dashboard".to_string(),
            Route::AdminDashboard => "/admin-dashboard".to_string(),
            Route::RegisterUser => "/register-new".to_string(),
            Route::Performance => "/performance".to_string(),
            Route::ShowPerformance { teacher_id } => format!("/showPerformance/{teacher_id}"),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Landing | Route::Login => Access::Public,
            Route::StudentDashboard => Access::Only(Role::Student),
            Route::TeacherDashboard => Access::Only(Role::Teacher),
            Route::AdminDashboard
            | Route::RegisterUser
            | Route::Performance
            | Route::ShowPerformance { .. } => Access::Only(Role::Admin),
        }
    }

    pub fn dashboard_for(role: Role) -> Route {
        match role {
            Role::Student => Route::StudentDashboard,
            Role::Teacher => Route::TeacherDashboard,
            Role::Admin => Route::AdminDashboard,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// One routing decision, purely from in-memory session state.
pub fn resolve(state: &SessionState, path: &str) -> Navigation {
    if state.loading {
        return Navigation::Loading;
    }

    let Some(route) = Route::parse(path) else {
        return Navigation::Redirect(ROOT_PATH.to_string());
    };

    if route == Route::Login {
        return match state.role() {
            Some(role) => Navigation::Mount(Route::dashboard_for(role)),
            None => Navigation::Mount(Route::Login),
        };
    }

    match route.access() {
        Access::Public => Navigation::Mount(route),
        Access::Only(required) => match state.role() {
            Some(role) if role == required => Navigation::Mount(route),
            _ => Navigation::Redirect(LOGIN_PATH.to_string()),
        },
    }
}

/// Follows redirects until a view mounts or the session is still loading.
pub fn navigate(state: &SessionState, path: &str) -> Navigation {
    let mut current = path.to_string();
    for _ in 0..MAX_REDIRECTS {
        match resolve(state, &current) {
            Navigation::Redirect(next) => current = next,
            settled => return settled,
        }
    }
    Navigation::Mount(Route::Landing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::user;

    fn signed_in(role: Role) -> SessionState {
        SessionState::authenticated(user("U01", "Someone", role))
    }

    #[test]
    fn parses_known_paths() {
        assert_eq!(Route::parse("/"), Some(Route::Landing));
        assert_eq!(Route::parse("/login/"), Some(Route::Login));
        assert_eq!(Route::parse("/performance?tab=1"), Some(Route::Performance));
        assert_eq!(
            Route::parse("/showPerformance/abc123"),
            Some(Route::ShowPerformance {
                teacher_id: "abc123".to_string()
            })
        );
        assert_eq!(Route::parse("/showPerformance/"), None);
        assert_eq!(Route::parse("/nowhere"), None);
    }

    #[test]
    fn paths_round_trip_through_parse() {
        let routes = [
            Route::Landing,
            Route::Login,
            Route::StudentDashboard,
            Route::TeacherDashboard,
            Route::AdminDashboard,
            Route::RegisterUser,
            Route::Performance,
            Route::ShowPerformance {
                teacher_id: "t9".to_string(),
            },
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.path()), Some(route));
        }
    }

    #[test]
    fn loading_session_defers_every_path() {
        let state = SessionState {
            loading: true,
            ..SessionState::default()
        };
        assert_eq!(resolve(&state, "/"), Navigation::Loading);
        assert_eq!(resolve(&state, "/admin-dashboard"), Navigation::Loading);
        assert_eq!(resolve(&state, "/nowhere"), Navigation::Loading);
    }

    #[test]
    fn anonymous_requests_to_protected_paths_go_to_login() {
        let state = SessionState::default();
        for path in [
            "/student-dashboard",
            "/teacher-dashboard",
            "/admin-dashboard",
            "/register-new",
            "/performance",
            "/showPerformance/t1",
        ] {
            assert_eq!(
                resolve(&state, path),
                Navigation::Redirect(LOGIN_PATH.to_string())
            );
            assert_eq!(navigate(&state, path), Navigation::Mount(Route::Login));
        }
    }

    #[test]
    fn wrong_role_is_treated_as_signed_out() {
        let student = signed_in(Role::Student);
        assert_eq!(
            resolve(&student, "/register-new"),
            Navigation::Redirect(LOGIN_PATH.to_string())
        );
        // Following the redirect lands on the student's own dashboard.
        assert_eq!(
            navigate(&student, "/register-new"),
            Navigation::Mount(Route::StudentDashboard)
        );
    }

    #[test]
    fn login_path_fans_out_by_role() {
        assert_eq!(
            resolve(&signed_in(Role::Student), "/login"),
            Navigation::Mount(Route::StudentDashboard)
        );
        assert_eq!(
            resolve(&signed_in(Role::Teacher), "/login"),
            Navigation::Mount(Route::TeacherDashboard)
        );
        assert_eq!(
            resolve(&signed_in(Role::Admin), "/login"),
            Navigation::Mount(Route::AdminDashboard)
        );
        assert_eq!(
            resolve(&SessionState::default(), "/login"),
            Navigation::Mount(Route::Login)
        );
    }

    #[test]
    fn matching_role_mounts_view() {
        assert_eq!(
            resolve(&signed_in(Role::Admin), "/showPerformance/t1"),
            Navigation::Mount(Route::ShowPerformance {
                teacher_id: "t1".to_string()
            })
        );
        assert_eq!(
            resolve(&signed_in(Role::Teacher), "/teacher-dashboard"),
            Navigation::Mount(Route::TeacherDashboard)
        );
    }

    #[test]
    fn unknown_paths_redirect_to_root() {
        let state = signed_in(Role::Admin);
        assert_eq!(
            resolve(&state, "/does-not-exist"),
            Navigation::Redirect(ROOT_PATH.to_string())
        );
        assert_eq!(navigate(&state, "/does-not-exist"), Navigation::Mount(Route::Landing));
    }
}
