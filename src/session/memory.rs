use std::collections::HashMap;
use std::error::Error;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::session::SessionStore;

/// In-memory session store. Used by tests and as an ephemeral fallback when
/// no session file should be written.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.entries.lock().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
