use std::error::Error;
use std::sync::Arc;

use log::{ info, warn, error };
use tokio::io::{ AsyncBufReadExt, BufReader };
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use chrono::{ Local, Utc };

use crate::api::ApiClient;
use crate::api::notes::ListNotesParams;
use crate::api::rituals::ListRitualsByStatusParams;
use crate::chat::{ ChatError, ReplyPoller };
use crate::cli::Args;
use crate::locale::{ self, LanguageCode };
use crate::models::chat::{ ChatBubble, Sender };
use crate::models::note::NoteDraft;
use crate::models::ritual::{ RitualCheckInPayload, RitualStatus, UpsertRitualPayload };
use crate::notes::group_notes_by_month;
use crate::session::{ self, SessionStore };

/// Interactive chat surface. Each input line runs one complete
/// send-and-await cycle before the next line is read, so at most one cycle
/// is ever outstanding per conversation.
pub struct Repl {
    client: Arc<ApiClient>,
    store: Arc<dyn SessionStore>,
    poller: ReplyPoller,
    locale: LanguageCode,
    args: Args,
}

fn render(bubble: &ChatBubble) {
    match bubble.sender {
        Sender::Incoming => println!("Whisper: {}", bubble.text),
        Sender::Outgoing => println!("You: {}", bubble.text),
    }
}

impl Repl {
    pub fn new(
        client: Arc<ApiClient>,
        store: Arc<dyn SessionStore>,
        poller: ReplyPoller,
        locale: LanguageCode,
        args: Args
    ) -> Self {
        Self { client, store, poller, locale, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        println!("{}! Whisper is available to help you.", locale::local_greeting(self.locale));
        println!(
            "Type a message, or /notes, /note <text>, /rituals, /garden, /goal <title>, /checkin yes|no, /health, /quit."
        );

        self.hydrate_transcript().await;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let input = line.trim();
            match input {
                "" => {
                    continue;
                }
                "/quit" | "/exit" => {
                    break;
                }
                "/health" => self.show_health().await,
                "/notes" => self.show_notes().await,
                "/rituals" => self.show_rituals().await,
                "/garden" => self.show_garden().await,
                _ if input.starts_with("/note ") => {
                    self.create_note(input.trim_start_matches("/note ").trim()).await;
                }
                _ if input.starts_with("/goal ") => {
                    self.set_daily_goal(input.trim_start_matches("/goal ").trim()).await;
                }
                _ if input.starts_with("/checkin ") => {
                    self.check_in(input.trim_start_matches("/checkin ").trim()).await;
                }
                _ => self.send_cycle(input).await,
            }
        }

        info!("Chat session closed.");
        Ok(())
    }

    /// Replays the cached conversation, if any, as the initial transcript.
    async fn hydrate_transcript(&self) {
        let thread_id = match self.store.get(session::THREAD_ID_KEY).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                return;
            }
            Err(e) => {
                warn!("Failed to read cached conversation id: {}", e);
                return;
            }
        };

        match self.poller.load_history(&thread_id, self.args.chat_history_take).await {
            Ok(bubbles) => {
                info!("Resumed conversation {} with {} messages", thread_id, bubbles.len());
                for bubble in &bubbles {
                    render(bubble);
                }
            }
            Err(e) => warn!("Failed to load history for thread {}: {}", thread_id, e),
        }
    }

    async fn send_cycle(&self, content: &str) {
        let pending = ChatBubble {
            id: Uuid::new_v4().to_string(),
            text: content.to_string(),
            sender: Sender::Outgoing,
        };
        render(&pending);

        let cached = match self.store.get(session::THREAD_ID_KEY).await {
            Ok(id) => id,
            Err(e) => {
                warn!("Failed to read cached conversation id: {}", e);
                None
            }
        };

        // Ctrl-C while a cycle is outstanding abandons the remaining polls
        // instead of killing the whole session.
        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        let outcome = self.poller.send_and_await_reply(cached.as_deref(), content, &cancel).await;
        watcher.abort();

        match outcome {
            Ok(reply) => {
                if let Err(e) = self.store.set(session::THREAD_ID_KEY, &reply.thread_id).await {
                    warn!("Failed to cache conversation id {}: {}", reply.thread_id, e);
                }
                render(&ChatBubble {
                    id: Uuid::new_v4().to_string(),
                    text: reply.text,
                    sender: Sender::Incoming,
                });
            }
            Err(ChatError::Cancelled) => {
                println!("(cancelled)");
            }
            Err(e) => {
                error!("{}", e);
                println!("(message not sent: {})", e);
            }
        }
    }

    async fn show_health(&self) {
        match self.client.get_health().await {
            Ok(health) => println!("Backend ok={} at {}: {}", health.ok, health.ts, health.message),
            Err(e) => println!("Health check failed: {}", e),
        }
    }

    async fn show_notes(&self) {
        let params = ListNotesParams {
            take: Some(self.args.notes_take),
            ..ListNotesParams::default()
        };
        let page = match self.client.list_notes(&params).await {
            Ok(page) => page,
            Err(e) => {
                println!("Could not list notes: {}", e);
                return;
            }
        };

        if page.items.is_empty() {
            println!("No notes yet.");
            return;
        }

        let grouped = group_notes_by_month(&page.items);
        for key in &grouped.keys {
            println!("{}", key);
            for note in &grouped.groups[key] {
                let title = note.title.as_deref().unwrap_or("(untitled)");
                match note.created_at {
                    Some(created_at) => println!("  {} {}", created_at.format("%d/%m/%Y"), title),
                    None => println!("  {}", title),
                }
            }
        }
    }

    async fn session_user_id(&self) -> Option<String> {
        match self.store.get(session::USER_ID_KEY).await {
            Ok(Some(id)) => Some(id),
            Ok(None) => {
                println!("No registered user in this session yet.");
                None
            }
            Err(e) => {
                println!("Could not read session: {}", e);
                None
            }
        }
    }

    async fn show_rituals(&self) {
        let user_id = match self.session_user_id().await {
            Some(id) => id,
            None => {
                return;
            }
        };

        let rituals = match self.client.list_rituals(&user_id).await {
            Ok(rituals) => rituals,
            Err(e) => {
                println!("Could not list rituals: {}", e);
                return;
            }
        };

        if rituals.is_empty() {
            println!("No rituals yet.");
            return;
        }

        for ritual in &rituals {
            let status = ritual.status.map(|s| s.as_str()).unwrap_or("UNKNOWN");
            println!("{} [{}] {}", locale::format_date(&ritual.local_date), status, ritual.title);
            if let Some(ai_reply) = &ritual.ai_reply {
                if !ai_reply.trim().is_empty() {
                    println!("  Whisper: {}", ai_reply);
                }
            }
        }
    }

    /// Completed rituals only, the "garden" view.
    async fn show_garden(&self) {
        let user_id = match self.session_user_id().await {
            Some(id) => id,
            None => {
                return;
            }
        };

        let params = ListRitualsByStatusParams {
            user_id,
            status: vec![RitualStatus::Completed],
            date_from: None,
            date_to: None,
            take: Some(self.args.notes_take),
            cursor: None,
            order: None,
        };
        match self.client.list_rituals_by_status(&params).await {
            Ok(page) => {
                if page.items.is_empty() {
                    println!("Nothing has bloomed yet.");
                    return;
                }
                for ritual in &page.items {
                    println!("{} {}", locale::format_date(&ritual.local_date), ritual.title);
                }
            }
            Err(e) => println!("Could not list completed rituals: {}", e),
        }
    }

    async fn create_note(&self, content: &str) {
        if content.is_empty() {
            println!("Usage: /note <text>");
            return;
        }

        let draft = NoteDraft {
            content: content.to_string(),
            ..NoteDraft::default()
        };
        match self.client.create_note(&draft).await {
            Ok(note) => {
                println!("Saved note {}.", note.id.as_deref().unwrap_or("(no id)"));
            }
            Err(e) => println!("Could not save note: {}", e),
        }
    }

    async fn set_daily_goal(&self, title: &str) {
        if title.is_empty() {
            println!("Usage: /goal <title>");
            return;
        }
        let user_id = match self.session_user_id().await {
            Some(id) => id,
            None => {
                return;
            }
        };

        let payload = UpsertRitualPayload {
            user_id,
            local_date: Local::now().format("%Y-%m-%d").to_string(),
            title: title.to_string(),
            note: None,
            subtasks: None,
        };
        match self.client.upsert_ritual(&payload).await {
            Ok(resp) => {
                println!("Today's ritual: {}", resp.ritual.title);
                if !resp.ai_reply.trim().is_empty() {
                    println!("  Whisper: {}", resp.ai_reply);
                }
            }
            Err(e) => println!("Could not save ritual: {}", e),
        }
    }

    async fn check_in(&self, answer: &str) {
        let achieved = match answer.to_lowercase().as_str() {
            "yes" | "y" => true,
            "no" | "n" => false,
            _ => {
                println!("Usage: /checkin yes|no");
                return;
            }
        };
        let user_id = match self.session_user_id().await {
            Some(id) => id,
            None => {
                return;
            }
        };

        let payload = RitualCheckInPayload {
            achieved,
            ai_reply: None,
            micro_step: None,
            check_in_at: Some(Utc::now()),
        };
        match self.client.register_ritual_check_in(&user_id, &payload).await {
            Ok(ritual) => {
                println!("Check-in recorded for {}.", ritual.title);
                if let Some(ai_reply) = &ritual.ai_reply {
                    if !ai_reply.trim().is_empty() {
                        println!("  Whisper: {}", ai_reply);
                    }
                }
            }
            Err(e) => println!("Could not record check-in: {}", e),
        }
    }
}
