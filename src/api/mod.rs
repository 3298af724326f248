//! Boundary to the external FAQ backend. The controllers only see these traits;
//! `http` holds the reqwest implementations.
pub mod http;

use async_trait::async_trait;
use thiserror::Error;
use crate::models::admin::{
    Analytics,
    DashboardStats,
    Faq,
    FaqPage,
    FaqPayload,
    FaqQuery,
    Settings,
    UnknownFilter,
    UnknownPage,
    UnknownQuestion,
};
use crate::models::chat::{ ChatRequest, ChatResponse };

pub use http::{ ApiConfig, HttpAdminApi, HttpChatApi };

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("cannot reach server: {0}")]
    Unreachable(String),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("invalid API url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("server error {status}{}", .message.as_deref().map(|m| format!(" - {}", m)).unwrap_or_default())]
    Status {
        status: u16,
        message: Option<String>,
    },
    #[error("unauthorized")]
    Unauthorized {
        message: Option<String>,
    },
    #[error("request rejected{}", .message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default())]
    Rejected {
        message: Option<String>,
    },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ApiError::Unreachable(err.to_string())
        } else {
            ApiError::Transport(err)
        }
    }
}

impl ApiError {
    /// Human-readable text supplied by the server, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            | ApiError::Status { message, .. }
            | ApiError::Unauthorized { message }
            | ApiError::Rejected { message } => message.as_deref(),
            _ => None,
        }
    }
}

#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn ask(&self, request: &ChatRequest) -> Result<ChatResponse, ApiError>;

    async fn suggestions(&self) -> Result<Vec<String>, ApiError>;

    /// Succeeds on any 2xx from the liveness probe.
    async fn health(&self) -> Result<(), ApiError>;

    fn base_url(&self) -> &str;
}

/// Every call except `login` carries the bearer token it is given.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Returns the issued token.
    async fn login(&self, username: &str, password: &str) -> Result<String, ApiError>;

    async fn verify(&self, token: &str) -> Result<(), ApiError>;

    async fn stats(&self, token: &str) -> Result<DashboardStats, ApiError>;

    async fn unknown_questions(
        &self,
        token: &str,
        filter: UnknownFilter,
        page: u32,
        limit: u32
    ) -> Result<UnknownPage, ApiError>;

    async fn unknown_question(&self, token: &str, id: i64) -> Result<UnknownQuestion, ApiError>;

    /// Turns an unknown question into a FAQ; returns the new FAQ id when reported.
    async fn answer_unknown(
        &self,
        token: &str,
        question_id: i64,
        answer: &str,
        category: &str
    ) -> Result<Option<i64>, ApiError>;

    async fn faqs(&self, token: &str, query: &FaqQuery) -> Result<FaqPage, ApiError>;

    async fn faq(&self, token: &str, id: i64) -> Result<Faq, ApiError>;

    async fn create_faq(&self, token: &str, faq: &FaqPayload<'_>) -> Result<Option<i64>, ApiError>;

    async fn update_faq(&self, token: &str, id: i64, faq: &FaqPayload<'_>) -> Result<(), ApiError>;

    async fn delete_faq(&self, token: &str, id: i64) -> Result<(), ApiError>;

    async fn analytics(&self, token: &str, days: u32) -> Result<Analytics, ApiError>;

    async fn settings(&self, token: &str) -> Result<Settings, ApiError>;
}
