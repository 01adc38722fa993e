pub mod auth;
pub mod chat;
pub mod notes;
pub mod rituals;

use std::error::Error;
use std::sync::Arc;

use log::warn;
use reqwest::{ Client as HttpClient, RequestBuilder, header::AUTHORIZATION };
use url::Url;

use crate::models::auth::HealthResponse;
use crate::session::{ self, SessionStore };

/// HTTP client for the WhisperDaily backend. Reads the bearer token from the
/// session store on every request, so a token saved after registration is
/// picked up without rebuilding the client.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    base_url: String,
    session: Arc<dyn SessionStore>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        session: Arc<dyn SessionStore>
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let parsed = Url::parse(base_url).map_err(|e|
            format!("Invalid API base URL '{}': {}", base_url, e)
        )?;
        let http = HttpClient::builder()
            .build()
            .map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)?;

        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.http
    }

    pub(crate) fn endpoint(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    /// Attaches `Authorization: Bearer <token>` when a token is present in
    /// the session, mirroring the mobile client's request interceptor.
    pub(crate) async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = match self.session.get(session::TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!("Failed to read session token: {}", e);
                None
            }
        };

        match token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    pub async fn get_health(&self) -> Result<HealthResponse, Box<dyn Error + Send + Sync>> {
        let url = self.endpoint("/health");
        let resp = self
            .authorize(self.http.get(&url)).await
            .send().await?
            .error_for_status()?
            .json::<HealthResponse>().await?;
        Ok(resp)
    }
}
