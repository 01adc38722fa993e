use std::collections::HashMap;
use std::error::Error;
use std::path::PathBuf;

use async_trait::async_trait;
use log::warn;
use tokio::fs;
use tokio::sync::Mutex;

use crate::session::SessionStore;

/// Session store backed by a single JSON object on disk. A missing or
/// unreadable file is treated as an empty session rather than an error.
pub struct FileSessionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> HashMap<String, String> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(_) => {
                return HashMap::new();
            }
        };

        match serde_json::from_str(&text) {
            Ok(map) => map,
            Err(e) => {
                warn!("Session file {} is corrupt, starting empty: {}", self.path.display(), e);
                HashMap::new()
            }
        }
    }

    async fn persist(
        &self,
        entries: &HashMap<String, String>
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e|
                    format!("Failed to create session directory '{}': {}", parent.display(), e)
                )?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json).await.map_err(|e|
            format!("Failed to write session file '{}': {}", self.path.display(), e)
        )?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        Ok(self.load().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await;
        entries.remove(key);
        self.persist(&entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session;

    #[tokio::test]
    async fn round_trips_session_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));

        assert!(store.get(session::TOKEN_KEY).await.unwrap().is_none());
        store.set(session::TOKEN_KEY, "abc123").await.unwrap();
        store.set(session::THREAD_ID_KEY, "t-42").await.unwrap();

        assert_eq!(store.get(session::TOKEN_KEY).await.unwrap().as_deref(), Some("abc123"));
        assert_eq!(store.get(session::THREAD_ID_KEY).await.unwrap().as_deref(), Some("t-42"));

        store.remove(session::THREAD_ID_KEY).await.unwrap();
        assert!(store.get(session::THREAD_ID_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn survives_process_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        {
            let store = FileSessionStore::new(path.clone());
            store.set(session::USER_ID_KEY, "u-1").await.unwrap();
        }

        let reopened = FileSessionStore::new(path.clone());
        assert_eq!(reopened.get(session::USER_ID_KEY).await.unwrap().as_deref(), Some("u-1"));
    }

    #[tokio::test]
    async fn corrupt_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let store = FileSessionStore::new(path.clone());
        assert!(store.get(session::TOKEN_KEY).await.unwrap().is_none());

        store.set(session::TOKEN_KEY, "fresh").await.unwrap();
        assert_eq!(store.get(session::TOKEN_KEY).await.unwrap().as_deref(), Some("fresh"));
    }
}
