use std::error::Error;

use async_trait::async_trait;
use serde_json::json;

use crate::api::ApiClient;
use crate::chat::ChatTransport;
use crate::models::chat::{ MessagePage, SendReply };

impl ApiClient {
    /// Sends a user message to the assistant. `thread_id` is `None` for the
    /// first message of a new conversation; the backend then assigns one and
    /// returns it in the acknowledgment.
    pub async fn send_chat_message(
        &self,
        content: &str,
        thread_id: Option<&str>
    ) -> Result<SendReply, Box<dyn Error + Send + Sync>> {
        if content.trim().is_empty() {
            return Err("Field 'content' is required".into());
        }

        let url = self.endpoint("/ai/chat");
        let body = json!({
            "content": content,
            "threadId": thread_id,
        });
        let resp = self
            .authorize(self.http().post(&url)).await
            .json(&body)
            .send().await?
            .error_for_status()?
            .json::<SendReply>().await?;
        Ok(resp)
    }

    /// Fetches one page of a conversation's messages. The backend does not
    /// guarantee an ordering direction for the page.
    pub async fn list_thread_messages(
        &self,
        thread_id: &str,
        take: usize,
        cursor: Option<&str>
    ) -> Result<MessagePage, Box<dyn Error + Send + Sync>> {
        let url = self.endpoint(&format!("/ai/threads/{}/messages", thread_id));
        let mut request = self
            .http()
            .get(&url)
            .query(&[("take", take.to_string())]);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        let resp = self
            .authorize(request).await
            .send().await?
            .error_for_status()?
            .json::<MessagePage>().await?;
        Ok(resp)
    }
}

#[async_trait]
impl ChatTransport for ApiClient {
    async fn send_message(
        &self,
        content: &str,
        thread_id: Option<&str>
    ) -> Result<SendReply, Box<dyn Error + Send + Sync>> {
        self.send_chat_message(content, thread_id).await
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        take: usize,
        cursor: Option<&str>
    ) -> Result<MessagePage, Box<dyn Error + Send + Sync>> {
        self.list_thread_messages(thread_id, take, cursor).await
    }
}
