use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Backend API Args ---
    /// Base URL of the WhisperDaily backend API
    #[arg(long, env = "API_BASE_URL", default_value = "http://127.0.0.1:3333")]
    pub api_base_url: String,

    // --- Session Store Args ---
    /// Session store type (file, memory)
    #[arg(long, env = "SESSION_STORE", default_value = "file")]
    pub session_store: String,

    /// Path of the JSON file backing the file session store
    #[arg(long, env = "SESSION_PATH", default_value = ".whisper-daily/session.json")]
    pub session_path: String,

    // --- Onboarding Args ---
    /// Locale sent when registering a new anonymous user (pt_BR, en_US, es_ES)
    #[arg(long, env = "APP_LOCALE", default_value = "en_US")]
    pub locale: String,

    /// IANA time zone reported during anonymous registration
    #[arg(long, env = "TIME_ZONE", default_value = "UTC")]
    pub time_zone: String,

    // --- Chat Poller Args ---
    /// Maximum number of history polls while waiting for an assistant reply
    #[arg(long, env = "CHAT_POLL_ATTEMPTS", default_value = "20")]
    pub chat_poll_attempts: usize,

    /// Delay between history polls, in milliseconds
    #[arg(long, env = "CHAT_POLL_DELAY_MS", default_value = "600")]
    pub chat_poll_delay_ms: u64,

    /// Page size requested on each history poll
    #[arg(long, env = "CHAT_PAGE_SIZE", default_value = "30")]
    pub chat_page_size: usize,

    /// Number of messages loaded when resuming a cached conversation
    #[arg(long, env = "CHAT_HISTORY_TAKE", default_value = "30")]
    pub chat_history_take: usize,

    // --- Notes Args ---
    /// Page size requested when listing notes
    #[arg(long, env = "NOTES_TAKE", default_value = "50")]
    pub notes_take: usize,
}
