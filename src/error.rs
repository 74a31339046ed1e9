use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Remote error ({status}): {}", message.as_deref().unwrap_or("no message"))]
    Remote {
        status: u16,
        message: Option<String>,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("View unmounted before the request settled")]
    Cancelled,

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// The remote-supplied message when there is one, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Remote {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}
