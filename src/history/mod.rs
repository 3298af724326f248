use chrono::{ DateTime, FixedOffset };
use log::{ debug, error, warn };
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use crate::models::chat::{ ConversationMessage, Sender };
use crate::platform::Clock;
use crate::storage::{ KeyValueStore, StorageError, CHAT_HISTORY_KEY, LAST_SAVE_KEY };

pub const MAX_HISTORY_ITEMS: usize = 100;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredMessage<'a> {
    #[serde(flatten)]
    message: &'a ConversationMessage,
    saved_at: &'a str,
}

/// Reads the persisted transcript. Unreadable storage yields an empty history and
/// individual entries that do not parse are skipped.
pub async fn load(store: &dyn KeyValueStore) -> Vec<ConversationMessage> {
    let raw = match store.get(CHAT_HISTORY_KEY).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            return Vec::new();
        }
        Err(e) => {
            error!("Failed to load chat history: {}", e);
            return Vec::new();
        }
    };
    let entries: Vec<JsonValue> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Discarding chat history with unrecognized shape: {}", e);
            return Vec::new();
        }
    };

    let mut messages = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<ConversationMessage>(entry) {
            Ok(msg) => messages.push(msg),
            Err(e) => error!("Error parsing history entry: {}", e),
        }
    }
    messages
}

/// The retained tail of `messages`: at most `cap` entries, oldest first.
pub fn retained(messages: &[ConversationMessage], cap: usize) -> &[ConversationMessage] {
    &messages[messages.len().saturating_sub(cap)..]
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatStats {
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub last_save: Option<DateTime<FixedOffset>>,
}

/// Durable, capped copy of the conversation.
#[derive(Clone)]
pub struct ChatHistory {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    cap: usize,
}

impl ChatHistory {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, cap: usize) -> Self {
        Self { store, clock, cap: cap.max(1) }
    }

    pub async fn load(&self) -> Vec<ConversationMessage> {
        load(self.store.as_ref()).await
    }

    /// Rewrites the whole persisted history from `messages`, keeping the newest `cap`.
    pub async fn save(&self, messages: &[ConversationMessage]) -> Result<(), StorageError> {
        let saved_at = self.clock.now().to_rfc3339();
        let stored: Vec<StoredMessage<'_>> = retained(messages, self.cap)
            .iter()
            .map(|message| StoredMessage { message, saved_at: &saved_at })
            .collect();
        let json = serde_json::to_string(&stored)?;
        self.store.set(CHAT_HISTORY_KEY, &json).await?;
        self.store.set(LAST_SAVE_KEY, &saved_at).await?;
        debug!("Saved {} of {} messages", stored.len(), messages.len());
        Ok(())
    }

    /// Removes the history blob only; used to recover from a full store.
    pub async fn discard(&self) -> Result<(), StorageError> {
        self.store.remove(CHAT_HISTORY_KEY).await
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(CHAT_HISTORY_KEY).await?;
        self.store.remove(LAST_SAVE_KEY).await
    }

    pub async fn stats(&self) -> Result<ChatStats, StorageError> {
        let messages = self.load().await;
        let last_save = self.store
            .get(LAST_SAVE_KEY).await?
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok());
        let user_messages = messages
            .iter()
            .filter(|m| m.sender == Sender::User)
            .count();
        Ok(ChatStats {
            total_messages: messages.len(),
            user_messages,
            assistant_messages: messages.len() - user_messages,
            last_save,
        })
    }
}

/// Plain-text transcript, one line per message.
pub fn format_transcript(messages: &[ConversationMessage]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let mut result = String::new();
    for msg in messages {
        let role_display = match msg.sender {
            Sender::User => "You",
            Sender::Assistant if msg.is_error => "Assistant (error)",
            Sender::Assistant => "Assistant",
        };
        result.push_str(&format!("[{}] {}: {}\n", msg.timestamp, role_display, msg.text));
    }
    result
}
