use std::path::PathBuf;

use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize };

/// Remote attachment metadata as stored by the backend's media service.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteAttachment {
    pub url: String,
    pub secure_url: String,
    pub public_id: String,
    pub resource_type: String,
    pub format: String,
    pub bytes: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<f64>,
    pub original_filename: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub note_attachments: Vec<NoteAttachment>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePage {
    pub items: Vec<Note>,
    pub next_cursor: Option<String>,
}

/// Outbound payload for creating a note. `files` are local paths uploaded as
/// multipart parts; the attachment records come back in the created `Note`.
#[derive(Clone, Debug, Default)]
pub struct NoteDraft {
    pub title: Option<String>,
    pub content: String,
    pub files: Vec<PathBuf>,
}

/// Partial update for an existing note.
#[derive(Clone, Debug, Default)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub remove_attachment_ids: Vec<String>,
    pub add_files: Vec<PathBuf>,
}
