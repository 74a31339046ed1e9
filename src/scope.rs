use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

use crate::error::ApiError;

/// Lifetime of one mounted view. Requests run through [`ViewScope::run`]
/// are bounded by a timeout, and results that settle after the view was
/// unmounted are discarded as [`ApiError::Cancelled`].
pub struct ViewScope {
    alive: Arc<AtomicBool>,
    limit: Duration,
}

#[cfg(test)]
#[derive(Clone)]
pub struct UnmountHandle(Arc<AtomicBool>);

#[cfg(test)]
impl UnmountHandle {
    pub fn unmount(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ViewScope {
    pub fn mount(limit: Duration) -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
            limit,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub fn handle(&self) -> UnmountHandle {
        UnmountHandle(self.alive.clone())
    }

    pub async fn run<T, F>(&self, request: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        if !self.is_alive() {
            return Err(ApiError::Cancelled);
        }
        let result = timeout(self.limit, request)
            .await
            .map_err(|_| ApiError::Timeout)?;

        if !self.is_alive() {
            debug!("Dropping result for unmounted view");
            return Err(ApiError::Cancelled);
        }
        result
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}
