use std::error::Error;
use std::path::Path;

use reqwest::multipart::{ Form, Part };
use tokio::fs;

use crate::api::ApiClient;
use crate::models::note::{ Note, NoteDraft, NotePage, NoteUpdate };

/// Sort direction for listing endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ListNotesParams {
    pub archived: Option<bool>,
    pub take: Option<usize>,
    pub cursor: Option<String>,
    pub order: Option<SortOrder>,
}

async fn file_part(path: &Path) -> Result<Part, Box<dyn Error + Send + Sync>> {
    let bytes = fs::read(path).await.map_err(|e|
        format!("Failed to read attachment '{}': {}", path.display(), e)
    )?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("attachment")
        .to_string();
    let part = Part::bytes(bytes).file_name(file_name).mime_str("application/octet-stream")?;
    Ok(part)
}

impl ApiClient {
    pub async fn list_notes(
        &self,
        params: &ListNotesParams
    ) -> Result<NotePage, Box<dyn Error + Send + Sync>> {
        let url = self.endpoint("/notes");
        let mut request = self.http().get(&url);

        if let Some(archived) = params.archived {
            request = request.query(&[("archived", archived.to_string())]);
        }
        if let Some(take) = params.take {
            request = request.query(&[("take", take.to_string())]);
        }
        if let Some(cursor) = &params.cursor {
            request = request.query(&[("cursor", cursor.as_str())]);
        }
        if let Some(order) = params.order {
            request = request.query(&[("order", order.as_str())]);
        }

        let resp = self
            .authorize(request).await
            .send().await?
            .error_for_status()?
            .json::<NotePage>().await?;
        Ok(resp)
    }

    /// Creates a note; text fields and local attachment files go out as one
    /// multipart form, matching the backend's upload route.
    pub async fn create_note(
        &self,
        draft: &NoteDraft
    ) -> Result<Note, Box<dyn Error + Send + Sync>> {
        let url = self.endpoint("/notes");
        let mut form = Form::new();

        if let Some(title) = &draft.title {
            form = form.text("title", title.clone());
        }
        form = form.text("content", draft.content.clone());

        for path in &draft.files {
            form = form.part("files", file_part(path).await?);
        }

        let resp = self
            .authorize(self.http().post(&url)).await
            .multipart(form)
            .send().await?
            .error_for_status()?
            .json::<Note>().await?;
        Ok(resp)
    }

    pub async fn get_note(&self, id: &str) -> Result<Note, Box<dyn Error + Send + Sync>> {
        let url = self.endpoint(&format!("/notes/{}", id));
        let resp = self
            .authorize(self.http().get(&url)).await
            .send().await?
            .error_for_status()?
            .json::<Note>().await?;
        Ok(resp)
    }

    pub async fn update_note(
        &self,
        id: &str,
        update: &NoteUpdate
    ) -> Result<Note, Box<dyn Error + Send + Sync>> {
        let url = self.endpoint(&format!("/notes/{}", id));
        let mut form = Form::new();

        if let Some(title) = &update.title {
            form = form.text("title", title.clone());
        }
        if let Some(content) = &update.content {
            form = form.text("content", content.clone());
        }
        if !update.remove_attachment_ids.is_empty() {
            form = form.text(
                "removeAttachmentIds",
                serde_json::to_string(&update.remove_attachment_ids)?
            );
        }
        for path in &update.add_files {
            form = form.part("files", file_part(path).await?);
        }

        let resp = self
            .authorize(self.http().patch(&url)).await
            .multipart(form)
            .send().await?
            .error_for_status()?
            .json::<Note>().await?;
        Ok(resp)
    }

    /// Hard delete: removes the note and its stored attachments.
    pub async fn delete_note(&self, id: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        if id.trim().is_empty() {
            return Err("A note id is required to delete a note".into());
        }

        let url = self.endpoint(&format!("/notes/{}", id));
        self
            .authorize(self.http().delete(&url)).await
            .send().await?
            .error_for_status()?;
        Ok(())
    }
}
