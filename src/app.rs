use std::fs::File;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use tracing::info;

use crate::client::Backend;
use crate::export::write_feedback_csv;
use crate::forms::{submit_registration, FeedbackForm, FieldError, RegisterForm};
use crate::notice::Notice;
use crate::router::{self, Navigation, Route};
use crate::scope::ViewScope;
use crate::session::SessionStore;
use crate::views::{self, MountOptions, Rendered};

#[derive(Debug)]
pub enum RegisterOutcome {
    Invalid(Vec<FieldError>),
    Submitted(Notice),
}

/// One client session: the session store plus navigation over it.
pub struct App<B> {
    session: SessionStore<B>,
    limit: Duration,
}

impl<B: Backend> App<B> {
    pub fn new(backend: B, limit: Duration) -> Self {
        Self {
            session: SessionStore::new(backend),
            limit,
        }
    }

    pub fn session(&self) -> &SessionStore<B> {
        &self.session
    }

    /// Restores whatever session the cookie jar implies.
    pub async fn bootstrap(&mut self) {
        self.session.fetch_current().await;
    }

    pub async fn open(&self, path: &str, options: &MountOptions) -> Rendered {
        match router::navigate(self.session.state(), path) {
            Navigation::Mount(route) => {
                info!("Mounting {route} for {path}");
                views::mount(&route, &self.session, self.limit, options).await
            }
            Navigation::Loading | Navigation::Redirect(_) => Rendered {
                route: Route::parse(path).unwrap_or(Route::Landing),
                body: views::loading(),
                notices: Vec::new(),
            },
        }
    }

    /// Signs in and mounts the dashboard for the signed-in role.
    pub async fn login(&mut self, enrollment_number: &str, password: &str) -> Result<Rendered, Notice> {
        let route = self.session.login(enrollment_number, password).await?;
        let mut rendered = self.open(&route.path(), &MountOptions::default()).await;

        if let Some(user) = self.session.user() {
            rendered.notices.insert(
                0,
                Notice::success("Login Successful", format!("Welcome back, {}!", user.full_name)),
            );
        }
        Ok(rendered)
    }

    pub async fn logout(&mut self) -> Result<(), Notice> {
        self.session.logout().await
    }

    fn require(&self, route: &Route) -> Result<(), Notice> {
        match router::resolve(self.session.state(), &route.path()) {
            Navigation::Mount(mounted) if mounted == *route => Ok(()),
            _ => Err(Notice::error(
                "Sign In Required",
                format!("{} is not available for the current session", route),
            )),
        }
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<RegisterOutcome, Notice> {
        self.require(&Route::RegisterUser)?;
        let request = match form.validate() {
            Ok(request) => request,
            Err(errors) => return Ok(RegisterOutcome::Invalid(errors)),
        };
        let notice = submit_registration(self.session.backend(), &request).await;
        Ok(RegisterOutcome::Submitted(notice))
    }

    pub async fn teacher_name(&self, teacher_id: &str) -> Result<String, Notice> {
        self.require(&Route::StudentDashboard)?;
        let scope = ViewScope::mount(self.limit);
        views::teacher_name(&scope, &self.session, teacher_id).await
    }

    pub async fn rate(&self, form: &FeedbackForm) -> Result<Notice, Notice> {
        self.require(&Route::StudentDashboard)?;
        let scope = ViewScope::mount(self.limit);
        views::rate_teacher(&scope, &self.session, form).await
    }

    /// Writes every feedback record to `path`. The file is only created once
    /// the role check and the fetch have both succeeded.
    pub async fn export(&self, path: &Path) -> anyhow::Result<usize> {
        if let Err(notice) = self.require(&Route::Performance) {
            bail!("{notice}");
        }
        let scope = ViewScope::mount(self.limit);
        let feedbacks = scope
            .run(self.session.backend().all_feedback())
            .await
            .context("failed to fetch feedback records")?;

        let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
        write_feedback_csv(file, &feedbacks)
    }
}
