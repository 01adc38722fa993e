use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize };

/// Author of a message inside a conversation thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single turn in a conversation, as returned by the message listing
/// endpoint. `created_at` is an ordering hint only; its absence is tolerated.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// One page of a conversation's messages. The ordering direction of `items`
/// is not fixed by the backend contract.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    pub items: Vec<Message>,
    pub next_cursor: Option<String>,
}

/// Acknowledgment of a message send. An empty `reply` means the assistant's
/// answer is computed asynchronously and must be fetched from history.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReply {
    pub reply: String,
    pub thread_id: String,
}

/// Final outcome of a send-and-await cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    pub thread_id: String,
}

/// Which side of the transcript a bubble renders on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sender {
    Incoming,
    Outgoing,
}

/// A message projected for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatBubble {
    pub id: String,
    pub text: String,
    pub sender: Sender,
}

impl From<&Message> for ChatBubble {
    fn from(message: &Message) -> Self {
        let sender = match message.role {
            Role::Assistant | Role::System => Sender::Incoming,
            Role::User => Sender::Outgoing,
        };
        Self {
            id: message.id.clone(),
            text: message.content.clone(),
            sender,
        }
    }
}
