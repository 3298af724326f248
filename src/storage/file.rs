use async_trait::async_trait;
use log::{ debug, warn };
use std::collections::HashMap;
use std::path::{ Path, PathBuf };
use tokio::fs;
use tokio::sync::Mutex;
use super::{ check_quota, KeyValueStore, StorageError };

const STORE_FILE: &str = "storage.json";
const QUARANTINE_EXTENSION: &str = "json.bad";

/// Stores every key in a single JSON object file inside the data directory.
///
/// The file is re-read on every access so that several processes sharing a data
/// directory see each other's writes. Writes are not coordinated between processes:
/// the last writer wins.
pub struct FileStore {
    path: PathBuf,
    quota: Option<usize>,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>, quota: Option<usize>) -> Self {
        Self {
            path: dir.as_ref().join(STORE_FILE),
            quota,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(HashMap::new()),
            Ok(contents) => {
                match serde_json::from_str(&contents) {
                    Ok(entries) => Ok(entries),
                    Err(e) => {
                        self.set_aside(&e).await;
                        Ok(HashMap::new())
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Moves an unparsable file out of the way so the next write cannot destroy it.
    async fn set_aside(&self, cause: &serde_json::Error) {
        let bad = self.path.with_extension(QUARANTINE_EXTENSION);
        match fs::rename(&self.path, &bad).await {
            Ok(()) => warn!("Unreadable storage file {} ({}); moved to {}", self.path.display(), cause, bad.display()),
            Err(e) => warn!("Unreadable storage file {} ({}); could not move it aside: {}", self.path.display(), cause, e),
        }
    }

    async fn save(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!("Wrote {} keys to {}", entries.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        check_quota(&entries, key, value, self.quota)?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.save(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_survive_a_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), None);
        store.set("lautech_session_id", "session_1_abc").await.unwrap();
        store.set("admin_token", "t").await.unwrap();
        store.remove("admin_token").await.unwrap();

        let reopened = FileStore::new(dir.path(), None);
        assert_eq!(
            reopened.get("lautech_session_id").await.unwrap().as_deref(),
            Some("session_1_abc")
        );
        assert_eq!(reopened.get("admin_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn creates_missing_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileStore::new(&nested, None);
        store.set("k", "v").await.unwrap();
        assert!(nested.join(STORE_FILE).exists());
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STORE_FILE), "{not json").unwrap();
        let store = FileStore::new(dir.path(), None);
        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn corrupt_file_is_kept_after_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STORE_FILE), "{not json").unwrap();
        let store = FileStore::new(dir.path(), None);
        store.set("k", "v").await.unwrap();

        let kept = std::fs::read_to_string(dir.path().join("storage.json.bad")).unwrap();
        assert_eq!(kept, "{not json");
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.path(), dir.path().join(STORE_FILE));
    }

    #[tokio::test]
    async fn quota_rejects_oversized_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), Some(10));
        let err = store.set("history", "0123456789").await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(store.get("history").await.unwrap(), None);
    }
}
