use chrono::{ DateTime, FixedOffset };
use log::{ info, warn };
use uuid::Uuid;
use crate::history;
use crate::platform::Clock;
use crate::storage::{ KeyValueStore, StorageError, SESSION_ID_KEY, SESSION_START_KEY };

/// `session_<unix millis>_<9 random lowercase alphanumerics>`.
pub fn generate_session_id(clock: &dyn Clock) -> String {
    let entropy = Uuid::new_v4().simple().to_string();
    format!("session_{}_{}", clock.now().timestamp_millis(), &entropy[..9])
}

/// Returns the persisted session id, creating and storing one on first use.
pub async fn get_or_create_session_id(
    store: &dyn KeyValueStore,
    clock: &dyn Clock
) -> Result<String, StorageError> {
    if let Some(existing) = store.get(SESSION_ID_KEY).await? {
        if !existing.trim().is_empty() {
            return Ok(existing);
        }
    }
    let session_id = generate_session_id(clock);
    store.set(SESSION_ID_KEY, &session_id).await?;
    info!("Created new session id {}", session_id);
    Ok(session_id)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    pub session_id: String,
    pub started_at: DateTime<FixedOffset>,
    pub messages_count: usize,
}

pub async fn session_stats(
    store: &dyn KeyValueStore,
    clock: &dyn Clock
) -> Result<SessionStats, StorageError> {
    let session_id = get_or_create_session_id(store, clock).await?;
    let stored_start = store
        .get(SESSION_START_KEY).await?
        .and_then(|s| match DateTime::parse_from_rfc3339(&s) {
            Ok(t) => Some(t),
            Err(e) => {
                warn!("Ignoring unreadable session start '{}': {}", s, e);
                None
            }
        });
    let started_at = match stored_start {
        Some(t) => t,
        None => {
            let now = clock.now().fixed_offset();
            store.set(SESSION_START_KEY, &now.to_rfc3339()).await?;
            now
        }
    };
    let messages_count = history::load(store).await.len();
    Ok(SessionStats { session_id, started_at, messages_count })
}
