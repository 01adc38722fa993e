mod file;
mod memory;

use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use crate::cli::Args;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

/// Session key holding the bearer token returned by anonymous registration.
pub const TOKEN_KEY: &str = "token";
/// Session key holding the registered user's id.
pub const USER_ID_KEY: &str = "userId";
/// Session key holding the UI language tag.
pub const LANGUAGE_KEY: &str = "language";
/// Session key caching the active conversation id across restarts.
pub const THREAD_ID_KEY: &str = "threadId";

/// Local key-value persistence for the session (token, user id, language,
/// cached conversation id). The device storage analog of the mobile app.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error + Send + Sync>>;

    async fn set(&self, key: &str, value: &str) -> Result<(), Box<dyn Error + Send + Sync>>;

    async fn remove(&self, key: &str) -> Result<(), Box<dyn Error + Send + Sync>>;
}

pub fn create_session_store(
    args: &Args
) -> Result<Arc<dyn SessionStore>, Box<dyn Error + Send + Sync>> {
    match args.session_store.to_lowercase().as_str() {
        "file" => {
            let store = FileSessionStore::new(args.session_path.clone());
            Ok(Arc::new(store))
        }
        "memory" => Ok(Arc::new(MemorySessionStore::new())),
        _ =>
            Err(
                Box::new(
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("Unsupported session store type: {}", args.session_store)
                    )
                )
            ),
    }
}

pub fn initialize_session_store(
    args: &Args
) -> Result<Arc<dyn SessionStore>, Box<dyn Error + Send + Sync>> {
    info!("Session will be stored in: {} at {}", args.session_store, args.session_path);
    create_session_store(args)
}
