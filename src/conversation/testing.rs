use async_trait::async_trait;
use std::sync::Mutex;
use crate::api::{ ApiError, ChatApi };
use crate::models::chat::{ ChatRequest, ChatResponse };
use crate::storage::{ KeyValueStore, StorageError };

/// Scripted stand-in for the chat backend.
#[derive(Default)]
pub struct FakeChatApi {
    answer: Option<ChatResponse>,
    status: Option<u16>,
    suggestions: Option<Vec<String>>,
    healthy: bool,
    requests: Mutex<Vec<ChatRequest>>,
}

impl FakeChatApi {
    pub fn answering(answer: &str, confidence: f64, match_type: &str) -> Self {
        Self {
            answer: Some(ChatResponse {
                answer: answer.to_string(),
                confidence: Some(confidence),
                match_type: Some(match_type.to_string()),
                suggestions: Vec::new(),
            }),
            healthy: true,
            ..Default::default()
        }
    }

    /// Every call fails as if the server were down.
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn failing_with(status: u16) -> Self {
        Self { status: Some(status), healthy: true, ..Default::default() }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = Some(suggestions);
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn unreachable() -> ApiError {
        ApiError::Unreachable("connection refused".into())
    }
}

#[async_trait]
impl ChatApi for FakeChatApi {
    async fn ask(&self, request: &ChatRequest) -> Result<ChatResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(status) = self.status {
            return Err(ApiError::Status { status, message: None });
        }
        self.answer.clone().ok_or_else(Self::unreachable)
    }

    async fn suggestions(&self) -> Result<Vec<String>, ApiError> {
        self.suggestions.clone().ok_or_else(Self::unreachable)
    }

    async fn health(&self) -> Result<(), ApiError> {
        if self.healthy { Ok(()) } else { Err(Self::unreachable()) }
    }

    fn base_url(&self) -> &str {
        "http://fake/api"
    }
}

/// Store whose writes always fail with an IO error.
pub struct BrokenStore;

impl BrokenStore {
    fn denied() -> StorageError {
        StorageError::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only data dir"))
    }
}

#[async_trait]
impl KeyValueStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(Self::denied())
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(Self::denied())
    }
}
