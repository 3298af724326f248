mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use crate::cli::Args;

pub const SESSION_ID_KEY: &str = "lautech_session_id";
pub const SESSION_START_KEY: &str = "lautech_session_start";
pub const CHAT_HISTORY_KEY: &str = "lautech_chat_history";
pub const LAST_SAVE_KEY: &str = "lautech_last_save";
pub const ADMIN_TOKEN_KEY: &str = "admin_token";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded: {needed} bytes needed, quota is {quota}")]
    QuotaExceeded {
        needed: usize,
        quota: usize,
    },
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage file is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable string key/value storage, the local equivalent of a browser's `localStorage`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

fn used_bytes(entries: &HashMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

/// Rejects a write that would push the store past `quota`.
fn check_quota(
    entries: &HashMap<String, String>,
    key: &str,
    value: &str,
    quota: Option<usize>
) -> Result<(), StorageError> {
    let Some(quota) = quota else {
        return Ok(());
    };
    let existing = entries.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
    let needed = used_bytes(entries) - existing + key.len() + value.len();
    if needed > quota {
        return Err(StorageError::QuotaExceeded { needed, quota });
    }
    Ok(())
}

pub fn create_store(args: &Args) -> Result<Arc<dyn KeyValueStore>, Box<dyn std::error::Error + Send + Sync>> {
    match args.storage_type.to_lowercase().as_str() {
        "file" => {
            let store = FileStore::new(args.resolve_data_dir(), args.storage_quota_bytes);
            info!("Local state will be stored in: {}", store.path().display());
            Ok(Arc::new(store))
        }
        "memory" => {
            info!("Local state is kept in memory and discarded on exit");
            Ok(Arc::new(MemoryStore::with_quota(args.storage_quota_bytes)))
        }
        other => Err(format!("Unsupported storage type: {}", other).into()),
    }
}
