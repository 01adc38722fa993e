pub mod api;
pub mod chat;
pub mod cli;
pub mod locale;
pub mod models;
pub mod notes;
pub mod repl;
pub mod session;

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use log::{ info, warn };

use api::ApiClient;
use chat::{ ChatTransport, PollerConfig, ReplyPoller };
use cli::Args;
use locale::LanguageCode;
use models::auth::AnonymousRegisterPayload;
use repl::Repl;
use session::{ SessionStore, initialize_session_store };

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("API Base URL: {}", args.api_base_url);
    info!("Session Store Type: {}", args.session_store);
    info!("Session Path: {}", args.session_path);
    info!("Locale: {}", args.locale);
    info!("Time Zone: {}", args.time_zone);
    info!("Chat Poll Attempts: {}", args.chat_poll_attempts);
    info!("Chat Poll Delay: {}ms", args.chat_poll_delay_ms);
    info!("Chat Page Size: {}", args.chat_page_size);
    info!("-------------------------");

    let app_locale: LanguageCode = args.locale
        .parse()
        .map_err(|e| format!("Invalid locale argument: {}", e))?;
    let store = initialize_session_store(&args)?;
    let client = Arc::new(ApiClient::new(&args.api_base_url, Arc::clone(&store))?);

    match client.get_health().await {
        Ok(health) => info!("Backend healthy at {}: {}", health.ts, health.message),
        Err(e) => warn!("Backend health check failed: {}", e),
    }

    ensure_session(&client, &store, app_locale, &args).await?;

    let poller_config = PollerConfig {
        max_attempts: args.chat_poll_attempts,
        page_size: args.chat_page_size,
        retry_delay: Duration::from_millis(args.chat_poll_delay_ms),
        ..PollerConfig::default()
    };
    let transport: Arc<dyn ChatTransport> = client.clone();
    let poller = ReplyPoller::new(transport, poller_config);

    let repl = Repl::new(Arc::clone(&client), store, poller, app_locale, args);
    repl.run().await
}

/// Registers an anonymous user on first launch; an existing token means the
/// session is resumed as-is.
async fn ensure_session(
    client: &ApiClient,
    store: &Arc<dyn SessionStore>,
    app_locale: LanguageCode,
    args: &Args
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let existing = store.get(session::TOKEN_KEY).await?;
    if existing.map_or(false, |t| !t.trim().is_empty()) {
        info!("Existing session token found. Skipping registration.");
        return Ok(());
    }

    info!("No session token found. Registering anonymous user...");
    let payload = AnonymousRegisterPayload {
        locale: app_locale,
        time_zone: args.time_zone.clone(),
    };
    let registered = client.register_anonymous(&payload).await?;

    store.set(session::TOKEN_KEY, &registered.token).await?;
    store.set(session::USER_ID_KEY, &registered.user_id).await?;
    store.set(session::LANGUAGE_KEY, app_locale.storage_tag()).await?;
    Ok(())
}
