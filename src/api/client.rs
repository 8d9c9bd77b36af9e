use super::messages::{
    EndSessionRequest, EndSessionResponse, ExecuteCodeRequest, ExecuteCodeResponse,
    QuestionPollResponse, StartSessionRequest, StartSessionResponse, SubmitAnswerRequest,
    SubmitAnswerResponse,
};
use crate::config::BackendConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failure talking to the interview backend
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Returns true if resending the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 429,
            ApiError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

/// The interview service request/response contract
///
/// Implementations:
/// - `HttpBackend`: JSON over HTTP
/// - test fakes that script responses
#[async_trait]
pub trait InterviewBackend: Send + Sync {
    /// Create a session and receive the welcome message and first question
    async fn start_session(
        &self,
        request: &StartSessionRequest,
    ) -> Result<StartSessionResponse, ApiError>;

    /// Submit one answer and receive the interviewer's reply
    async fn submit_answer(
        &self,
        request: &SubmitAnswerRequest,
    ) -> Result<SubmitAnswerResponse, ApiError>;

    /// Poll the current question when a reply did not embed one
    async fn fetch_question(&self, session_id: &str) -> Result<QuestionPollResponse, ApiError>;

    /// Run candidate code remotely
    async fn execute_code(
        &self,
        request: &ExecuteCodeRequest,
    ) -> Result<ExecuteCodeResponse, ApiError>;

    /// Write the end-of-session results
    async fn end_session(
        &self,
        request: &EndSessionRequest,
    ) -> Result<EndSessionResponse, ApiError>;

    /// Read back the conversation history (recovery/replay only)
    async fn conversation_history(&self, session_id: &str)
        -> Result<serde_json::Value, ApiError>;

    /// Read back stored results (recovery/replay only)
    async fn results(&self, session_id: &str) -> Result<serde_json::Value, ApiError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// `InterviewBackend` over JSON/HTTP
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        info!(
            "Interview backend at {} (timeout {}s)",
            config.base_url, config.timeout_secs
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("POST {}", url);
        let response = self
            .authorize(self.client.post(&url).json(body))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn get<R>(&self, path: &str) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self.authorize(self.client.get(&url)).send().await?;
        Self::decode(response).await
    }

    async fn decode<R>(response: reqwest::Response) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Backend responded with {}: {}", status, body);
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl InterviewBackend for HttpBackend {
    async fn start_session(
        &self,
        request: &StartSessionRequest,
    ) -> Result<StartSessionResponse, ApiError> {
        self.post("start", request).await
    }

    async fn submit_answer(
        &self,
        request: &SubmitAnswerRequest,
    ) -> Result<SubmitAnswerResponse, ApiError> {
        self.post("conversation/submit", request).await
    }

    async fn fetch_question(&self, session_id: &str) -> Result<QuestionPollResponse, ApiError> {
        self.get(&format!("question/{}", session_id)).await
    }

    async fn execute_code(
        &self,
        request: &ExecuteCodeRequest,
    ) -> Result<ExecuteCodeResponse, ApiError> {
        self.post("code/execute", request).await
    }

    async fn end_session(
        &self,
        request: &EndSessionRequest,
    ) -> Result<EndSessionResponse, ApiError> {
        self.post("end", request).await
    }

    async fn conversation_history(
        &self,
        session_id: &str,
    ) -> Result<serde_json::Value, ApiError> {
        self.get(&format!("conversation/history/{}", session_id))
            .await
    }

    async fn results(&self, session_id: &str) -> Result<serde_json::Value, ApiError> {
        self.get(&format!("results/{}", session_id)).await
    }

    fn name(&self) -> &str {
        "HTTP interview backend"
    }
}
