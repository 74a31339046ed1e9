use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{
    Credentials, Feedback, FeedbackSubmission, RegisterRequest, TeacherPerformance,
    TeacherProfile, User, UserRecord,
};

/// The remote feedback API as seen by the session store and the views.
#[allow(async_fn_in_trait)]
pub trait Backend {
    async fn current_user(&self) -> Result<User, ApiError>;
    async fn login(&self, credentials: &Credentials) -> Result<User, ApiError>;
    async fn logout(&self) -> Result<(), ApiError>;
    async fn register(&self, request: &RegisterRequest) -> Result<Option<String>, ApiError>;
    async fn list_users(&self) -> Result<Vec<UserRecord>, ApiError>;
    async fn all_feedback(&self) -> Result<Vec<Feedback>, ApiError>;
    async fn submitted_feedback(&self) -> Result<Vec<Feedback>, ApiError>;
    async fn submit_feedback(&self, submission: &FeedbackSubmission) -> Result<(), ApiError>;
    async fn teacher_performance(&self, teacher_id: &str) -> Result<TeacherPerformance, ApiError>;
    async fn own_feedback(&self) -> Result<Vec<Feedback>, ApiError>;
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Deserialize)]
struct MessageEnvelope {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct FeedbackEnvelope {
    #[serde(default)]
    feedbacks: Vec<Feedback>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserList {
    Bare(Vec<UserRecord>),
    Wrapped { teachers: Vec<UserRecord> },
}

#[derive(Deserialize)]
struct PerformanceEnvelope {
    teacher: TeacherProfile,
    #[serde(default)]
    feedbacks: Vec<Feedback>,
    #[serde(rename = "overallAvg", default)]
    overall_avg: Option<serde_json::Value>,
}

/// HTTP client pinned to one origin that keeps the session cookie between
/// requests.
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http = Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        info!("API client ready for {}", config.api_url);
        Ok(Self {
            http,
            base_url: config.api_url.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Transport(e)
            }
        })?;
        let status = response.status();
        debug!("{path} -> {status}");

        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<MessageEnvelope>()
            .await
            .ok()
            .and_then(|body| body.message);
        warn!("{path} failed with {status}");
        Err(ApiError::Remote {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::GET, path), path).await?;
        decode(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .send(self.request(Method::POST, path).json(body), path)
            .await?;
        decode(response).await
    }

    async fn post_discard<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        self.send(self.request(Method::POST, path).json(body), path)
            .await
            .map(|_| ())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

/// `overallAvg` arrives as a number or as a pre-formatted string.
fn parse_overall_avg(value: Option<serde_json::Value>) -> f64 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

impl Backend for ApiClient {
    async fn current_user(&self) -> Result<User, ApiError> {
        let envelope: UserEnvelope = self.post_json("/user/me", &json!({})).await?;
        Ok(envelope.user)
    }

    async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        let envelope: UserEnvelope = self.post_json("/user/login", credentials).await?;
        Ok(envelope.user)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.post_discard("/user/logout", &json!({})).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<Option<String>, ApiError> {
        let envelope: MessageEnvelope = self.post_json("/user/register", request).await?;
        Ok(envelope.message)
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, ApiError> {
        let list: UserList = self.get_json("/user/getAll").await?;
        Ok(match list {
            UserList::Bare(users) => users,
            UserList::Wrapped { teachers } => teachers,
        })
    }

    async fn all_feedback(&self) -> Result<Vec<Feedback>, ApiError> {
        let envelope: FeedbackEnvelope = self.get_json("/user/getAllFeedback").await?;
        Ok(envelope.feedbacks)
    }

    async fn submitted_feedback(&self) -> Result<Vec<Feedback>, ApiError> {
        let envelope: FeedbackEnvelope = self.get_json("/user/Submitedfeedback").await?;
        Ok(envelope.feedbacks)
    }

    async fn submit_feedback(&self, submission: &FeedbackSubmission) -> Result<(), ApiError> {
        self.post_discard("/user/feedback", submission).await
    }

    async fn teacher_performance(&self, teacher_id: &str) -> Result<TeacherPerformance, ApiError> {
        let path = format!("/user/getTeacherPerformance/{teacher_id}");
        let envelope: PerformanceEnvelope = self.get_json(&path).await?;
        Ok(TeacherPerformance {
            teacher: envelope.teacher,
            feedbacks: envelope.feedbacks,
            overall_avg: parse_overall_avg(envelope.overall_avg),
        })
    }

    async fn own_feedback(&self) -> Result<Vec<Feedback>, ApiError> {
        let envelope: FeedbackEnvelope = self.get_json("/user/getFeedback").await?;
        Ok(envelope.feedbacks)
    }
}
