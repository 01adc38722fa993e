use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RitualStatus {
    Planned,
    Completed,
    Missed,
}

impl RitualStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RitualStatus::Planned => "PLANNED",
            RitualStatus::Completed => "COMPLETED",
            RitualStatus::Missed => "MISSED",
        }
    }
}

/// Sub-item of a ritual as returned by the backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub ritual_id: String,
    pub content: String,
    pub done: bool,
    pub order: i32,
}

/// Sub-item supplied when creating or updating a ritual.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ritual {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub note: Option<String>,
    /// Calendar day the ritual belongs to, in the user's local time.
    pub local_date: String,
    #[serde(default)]
    pub status: Option<RitualStatus>,
    #[serde(default)]
    pub check_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub achieved: Option<bool>,
    #[serde(default)]
    pub ai_reply: Option<String>,
    #[serde(default)]
    pub micro_step: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRitualPayload {
    pub user_id: String,
    /// Sent as an ISO date string.
    pub local_date: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<SubtaskDraft>>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRitualResponse {
    pub ritual: Ritual,
    pub ai_reply: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RitualCheckInPayload {
    pub achieved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub micro_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RitualUpdatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<SubtaskDraft>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RitualStatus>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RitualPage {
    pub items: Vec<Ritual>,
    pub next_cursor: Option<String>,
}
