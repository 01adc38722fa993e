use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use log::{ info, warn };
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::chat::{ ChatError, ChatTransport };
use crate::models::chat::{ ChatBubble, ChatReply, Message, Role };

/// Shown in place of a reply the backend never delivered. The transcript
/// must never end a cycle with an empty bubble.
pub const FALLBACK_REPLY: &str =
    "I couldn't fetch a reply right now. Please try again in a moment.";

const DEFAULT_MAX_ATTEMPTS: usize = 20;
const DEFAULT_PAGE_SIZE: usize = 30;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(600);

#[derive(Clone, Debug)]
pub struct PollerConfig {
    /// Maximum number of history fetches while waiting for a reply.
    pub max_attempts: usize,
    /// Page size requested on each history fetch.
    pub page_size: usize,
    /// Pause between history fetches.
    pub retry_delay: Duration,
    /// Text returned when the attempt budget is exhausted.
    pub fallback_reply: String,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            page_size: DEFAULT_PAGE_SIZE,
            retry_delay: DEFAULT_RETRY_DELAY,
            fallback_reply: FALLBACK_REPLY.to_string(),
        }
    }
}

/// Obtains the assistant's response to a just-sent user message. The backend
/// may answer synchronously (reply embedded in the send acknowledgment) or
/// asynchronously, in which case the reply is awaited by re-fetching the
/// freshest window of the conversation's history.
pub struct ReplyPoller {
    transport: Arc<dyn ChatTransport>,
    config: PollerConfig,
}

impl ReplyPoller {
    pub fn new(transport: Arc<dyn ChatTransport>, config: PollerConfig) -> Self {
        Self { transport, config }
    }

    /// Sends `content` and resolves the assistant's reply together with the
    /// (possibly newly created) conversation id. Persisting that id is the
    /// caller's job. Only a failed send surfaces as an error; an exhausted
    /// wait resolves to the configured fallback text.
    pub async fn send_and_await_reply(
        &self,
        thread_id: Option<&str>,
        content: &str,
        cancel: &CancellationToken
    ) -> Result<ChatReply, ChatError> {
        let sent = self.transport
            .send_message(content, thread_id).await
            .map_err(|source| ChatError::SendFailed { source })?;
        let thread_id = sent.thread_id;

        let immediate = sent.reply.trim();
        if !immediate.is_empty() {
            return Ok(ChatReply {
                text: immediate.to_string(),
                thread_id,
            });
        }

        info!("Reply pending for thread {}. Polling message history...", thread_id);

        for attempt in 1..=self.config.max_attempts {
            if cancel.is_cancelled() {
                info!("Chat cycle for thread {} cancelled after {} attempts", thread_id, attempt - 1);
                return Err(ChatError::Cancelled);
            }

            // Always re-fetch the latest window without a cursor: cursor
            // semantics are not guaranteed to fit wait-for-new-item.
            match self.transport.list_messages(&thread_id, self.config.page_size, None).await {
                Ok(page) => {
                    if let Some(reply) = latest_assistant_reply(&page.items) {
                        return Ok(ChatReply { text: reply, thread_id });
                    }
                }
                Err(e) => {
                    warn!(
                        "Poll attempt {}/{} for thread {} failed: {}",
                        attempt,
                        self.config.max_attempts,
                        thread_id,
                        e
                    );
                }
            }

            if attempt < self.config.max_attempts {
                sleep(self.config.retry_delay).await;
            }
        }

        warn!(
            "No assistant reply for thread {} after {} attempts, falling back",
            thread_id,
            self.config.max_attempts
        );
        Ok(ChatReply {
            text: self.config.fallback_reply.clone(),
            thread_id,
        })
    }

    /// One-shot history hydration for a previously cached conversation id.
    /// The page is used verbatim as the initial transcript; no retries.
    pub async fn load_history(
        &self,
        thread_id: &str,
        take: usize
    ) -> Result<Vec<ChatBubble>, Box<dyn Error + Send + Sync>> {
        let page = self.transport.list_messages(thread_id, take, None).await?;
        Ok(page.items.iter().map(ChatBubble::from).collect())
    }
}

/// Picks the most recent assistant message with non-empty content, without
/// assuming which direction the page is ordered in: timestamps win when
/// both candidates carry one, later page position wins otherwise.
fn latest_assistant_reply(items: &[Message]) -> Option<String> {
    let mut best: Option<&Message> = None;

    for message in items {
        if message.role != Role::Assistant || message.content.trim().is_empty() {
            continue;
        }
        best = match best {
            None => Some(message),
            Some(current) =>
                match (message.created_at, current.created_at) {
                    (Some(candidate), Some(held)) if candidate < held => Some(current),
                    _ => Some(message),
                }
        };
    }

    best.map(|m| m.content.trim().to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{ AtomicUsize, Ordering };

    use chrono::{ TimeZone, Utc };
    use tokio::sync::Mutex;

    use super::*;
    use crate::models::chat::{ MessagePage, SendReply, Sender };

    struct MockTransport {
        send_response: Result<SendReply, String>,
        pages: Mutex<VecDeque<Result<MessagePage, String>>>,
        send_calls: AtomicUsize,
        list_calls: AtomicUsize,
    }

    impl MockTransport {
        fn new(send_response: Result<SendReply, String>) -> Self {
            Self {
                send_response,
                pages: Mutex::new(VecDeque::new()),
                send_calls: AtomicUsize::new(0),
                list_calls: AtomicUsize::new(0),
            }
        }

        async fn push_page(&self, page: Result<MessagePage, String>) {
            self.pages.lock().await.push_back(page);
        }

        fn list_calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ChatTransport for MockTransport {
        async fn send_message(
            &self,
            _content: &str,
            _thread_id: Option<&str>
        ) -> Result<SendReply, Box<dyn Error + Send + Sync>> {
            self.send_calls.fetch_add(1, Ordering::SeqCst);
            self.send_response.clone().map_err(|e| e.into())
        }

        async fn list_messages(
            &self,
            _thread_id: &str,
            _take: usize,
            _cursor: Option<&str>
        ) -> Result<MessagePage, Box<dyn Error + Send + Sync>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            match self.pages.lock().await.pop_front() {
                Some(Ok(page)) => Ok(page),
                Some(Err(e)) => Err(e.into()),
                None => Ok(empty_page()),
            }
        }
    }

    fn sent(reply: &str, thread_id: &str) -> Result<SendReply, String> {
        Ok(SendReply {
            reply: reply.to_string(),
            thread_id: thread_id.to_string(),
        })
    }

    fn message(id: &str, role: Role, content: &str, ts: Option<i64>) -> Message {
        Message {
            id: id.to_string(),
            role,
            content: content.to_string(),
            created_at: ts.map(|secs| Utc.timestamp_opt(secs, 0).unwrap()),
        }
    }

    fn page_of(items: Vec<Message>) -> MessagePage {
        MessagePage { items, next_cursor: None }
    }

    fn empty_page() -> MessagePage {
        page_of(Vec::new())
    }

    fn poller(transport: Arc<MockTransport>, config: PollerConfig) -> ReplyPoller {
        ReplyPoller::new(transport, config)
    }

    #[tokio::test]
    async fn fast_path_skips_history_entirely() {
        let transport = Arc::new(MockTransport::new(sent("hi there", "t1")));
        let poller = poller(Arc::clone(&transport), PollerConfig::default());

        let reply = poller
            .send_and_await_reply(None, "hello", &CancellationToken::new()).await
            .unwrap();

        assert_eq!(reply.text, "hi there");
        assert_eq!(reply.thread_id, "t1");
        assert_eq!(transport.list_calls(), 0);
    }

    #[tokio::test]
    async fn async_reply_found_on_first_poll() {
        let transport = Arc::new(MockTransport::new(sent("", "t2")));
        transport.push_page(Ok(page_of(vec![
            message("u1", Role::User, "hello", Some(100)),
            message("a1", Role::Assistant, "ok", Some(101)),
        ]))).await;
        let poller = poller(Arc::clone(&transport), PollerConfig::default());

        let reply = poller
            .send_and_await_reply(Some("t2"), "hello", &CancellationToken::new()).await
            .unwrap();

        assert_eq!(reply.text, "ok");
        assert_eq!(reply.thread_id, "t2");
        assert_eq!(transport.list_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn async_reply_found_on_fourth_poll_after_three_delays() {
        let transport = Arc::new(MockTransport::new(sent("", "t3")));
        for _ in 0..3 {
            transport.push_page(Ok(empty_page())).await;
        }
        transport.push_page(Ok(page_of(vec![
            message("a1", Role::Assistant, "finally", Some(500)),
        ]))).await;
        let config = PollerConfig::default();
        let delay = config.retry_delay;
        let poller = poller(Arc::clone(&transport), config);

        let start = tokio::time::Instant::now();
        let reply = poller
            .send_and_await_reply(Some("t3"), "hello", &CancellationToken::new()).await
            .unwrap();

        assert_eq!(reply.text, "finally");
        assert_eq!(transport.list_calls(), 4);
        assert_eq!(start.elapsed(), delay * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_resolves_to_fallback_after_exact_budget() {
        let transport = Arc::new(MockTransport::new(sent("", "t4")));
        let config = PollerConfig {
            max_attempts: 5,
            ..PollerConfig::default()
        };
        let poller = poller(Arc::clone(&transport), config);

        let reply = poller
            .send_and_await_reply(Some("t4"), "hello", &CancellationToken::new()).await
            .unwrap();

        assert_eq!(reply.text, FALLBACK_REPLY);
        assert_eq!(reply.thread_id, "t4");
        assert_eq!(transport.list_calls(), 5);
    }

    #[tokio::test]
    async fn newest_assistant_message_wins_in_either_page_direction() {
        let older = message("a1", Role::Assistant, "older", Some(100));
        let newer = message("a2", Role::Assistant, "newer", Some(200));

        for items in [
            vec![older.clone(), newer.clone()],
            vec![newer.clone(), older.clone()],
        ] {
            let transport = Arc::new(MockTransport::new(sent("", "t5")));
            transport.push_page(Ok(page_of(items))).await;
            let poller = poller(Arc::clone(&transport), PollerConfig::default());

            let reply = poller
                .send_and_await_reply(Some("t5"), "hello", &CancellationToken::new()).await
                .unwrap();
            assert_eq!(reply.text, "newer");
        }
    }

    #[tokio::test]
    async fn send_failure_is_fatal_and_polls_nothing() {
        let transport = Arc::new(MockTransport::new(Err("connection refused".to_string())));
        let poller = poller(Arc::clone(&transport), PollerConfig::default());

        let err = poller
            .send_and_await_reply(None, "hello", &CancellationToken::new()).await
            .unwrap_err();

        assert!(matches!(err, ChatError::SendFailed { .. }));
        assert_eq!(transport.list_calls(), 0);
    }

    #[tokio::test]
    async fn hydration_is_idempotent_and_projects_roles() {
        let items = vec![
            message("s1", Role::System, "welcome", Some(1)),
            message("u1", Role::User, "hi", Some(2)),
            message("a1", Role::Assistant, "hello!", Some(3)),
        ];
        let transport = Arc::new(MockTransport::new(sent("", "t6")));
        transport.push_page(Ok(page_of(items.clone()))).await;
        transport.push_page(Ok(page_of(items))).await;
        let poller = poller(Arc::clone(&transport), PollerConfig::default());

        let first = poller.load_history("t6", 30).await.unwrap();
        let second = poller.load_history("t6", 30).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].sender, Sender::Incoming);
        assert_eq!(first[1].sender, Sender::Outgoing);
        assert_eq!(first[2].sender, Sender::Incoming);
        assert_eq!(transport.list_calls(), 2);
    }

    #[tokio::test]
    async fn cancelled_cycle_stops_before_any_poll() {
        let transport = Arc::new(MockTransport::new(sent("", "t7")));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let poller = poller(Arc::clone(&transport), PollerConfig::default());

        let err = poller
            .send_and_await_reply(Some("t7"), "hello", &cancel).await
            .unwrap_err();

        assert!(matches!(err, ChatError::Cancelled));
        assert_eq!(transport.list_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_failure_consumes_an_attempt_without_aborting() {
        let transport = Arc::new(MockTransport::new(sent("", "t8")));
        transport.push_page(Err("server hiccup".to_string())).await;
        transport.push_page(Ok(page_of(vec![
            message("a1", Role::Assistant, "recovered", Some(10)),
        ]))).await;
        let poller = poller(Arc::clone(&transport), PollerConfig::default());

        let reply = poller
            .send_and_await_reply(Some("t8"), "hello", &CancellationToken::new()).await
            .unwrap();

        assert_eq!(reply.text, "recovered");
        assert_eq!(transport.list_calls(), 2);
    }

    #[tokio::test]
    async fn blank_replies_do_not_qualify() {
        // Whitespace in the send acknowledgment means "compute async", and a
        // whitespace assistant message in history is skipped the same way.
        let transport = Arc::new(MockTransport::new(sent("   ", "t9")));
        transport.push_page(Ok(page_of(vec![
            message("a1", Role::Assistant, "   ", Some(300)),
            message("a2", Role::Assistant, "substance", Some(200)),
        ]))).await;
        let poller = poller(Arc::clone(&transport), PollerConfig::default());

        let reply = poller
            .send_and_await_reply(Some("t9"), "hello", &CancellationToken::new()).await
            .unwrap();

        assert_eq!(reply.text, "substance");
        assert_eq!(transport.list_calls(), 1);
    }

    #[test]
    fn without_timestamps_the_later_page_position_wins() {
        let items = vec![
            message("a1", Role::Assistant, "first", None),
            message("u1", Role::User, "hi", None),
            message("a2", Role::Assistant, "second", None),
        ];
        assert_eq!(latest_assistant_reply(&items).as_deref(), Some("second"));
        assert_eq!(latest_assistant_reply(&[]), None);
    }
}
