pub mod poller;

use std::error::Error as StdError;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::chat::{ MessagePage, SendReply };

pub use poller::{ PollerConfig, ReplyPoller, FALLBACK_REPLY };

/// The two backend collaborators the reply poller depends on. Kept behind a
/// trait so a push-based implementation can replace polling without touching
/// the caller's contract.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(
        &self,
        content: &str,
        thread_id: Option<&str>
    ) -> Result<SendReply, Box<dyn StdError + Send + Sync>>;

    async fn list_messages(
        &self,
        thread_id: &str,
        take: usize,
        cursor: Option<&str>
    ) -> Result<MessagePage, Box<dyn StdError + Send + Sync>>;
}

/// Failures of a send-and-await cycle. Only a failed send crosses this
/// boundary as an error: a message that demonstrably never reached the
/// server must not be rendered as a reply. Everything after a successful
/// send degrades to the fallback reply instead.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("failed to send message: {source}")]
    SendFailed {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("chat cycle was cancelled")]
    Cancelled,
}
