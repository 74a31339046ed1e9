use tracing::{debug, info, warn};

use crate::client::Backend;
use crate::models::{Credentials, Role, User};
use crate::notice::Notice;
use crate::router::Route;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SessionState {
    pub fn authenticated(user: User) -> Self {
        Self {
            user: Some(user),
            loading: false,
            error: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|user| user.role)
    }
}

/// The only shared state of the client. Views read it; only
/// [`fetch_current`](Self::fetch_current), [`login`](Self::login) and
/// [`logout`](Self::logout) change it.
pub struct SessionStore<B> {
    backend: B,
    state: SessionState,
}

impl<B: Backend> SessionStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: SessionState::default(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    /// Asks the server for the current session. Any failure means "not signed in".
    pub async fn fetch_current(&mut self) {
        self.state.loading = true;
        match self.backend.current_user().await {
            Ok(user) => {
                info!("Session restored for {} ({})", user.full_name, user.role);
                self.state = SessionState::authenticated(user);
            }
            Err(e) => {
                debug!("No active session: {e}");
                self.state.user = None;
            }
        }
        self.state.loading = false;
    }

    /// Signs in and returns the dashboard for the user's role.
    pub async fn login(&mut self, enrollment_number: &str, password: &str) -> Result<Route, Notice> {
        self.state.loading = true;
        self.state.error = None;

        let credentials = Credentials {
            enrollment_number: enrollment_number.to_string(),
            password: password.to_string(),
        };
        let result = self.backend.login(&credentials).await;
        self.state.loading = false;

        match result {
            Ok(user) => {
                info!("Logged in as {} ({})", user.enrollment_number, user.role);
                let route = Route::dashboard_for(user.role);
                self.state = SessionState::authenticated(user);
                Ok(route)
            }
            Err(e) => {
                let message = e.user_message("Login failed");
                warn!("Login failed for {enrollment_number}: {e}");
                self.state.user = None;
                self.state.error = Some(message.clone());
                Err(Notice::error("Login Failed", message))
            }
        }
    }

    /// Invalidates the remote session and always clears the local one. A
    /// failed remote call is reported but does not keep the user signed in.
    pub async fn logout(&mut self) -> Result<(), Notice> {
        let result = self.backend.logout().await;
        self.state.user = None;
        self.state.error = None;

        result.map_err(|e| {
            warn!("Remote logout failed: {e}");
            Notice::warning(
                "Logout Failed",
                "Signed out locally, but the server session could not be closed",
            )
        })
    }
}
