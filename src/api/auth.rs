use std::error::Error;

use log::info;

use crate::api::ApiClient;
use crate::models::auth::{ AnonymousRegisterPayload, AnonymousRegisterResponse };

impl ApiClient {
    /// Registers an anonymous user and returns the session credentials.
    /// Persisting the returned token and user id is the caller's job.
    pub async fn register_anonymous(
        &self,
        payload: &AnonymousRegisterPayload
    ) -> Result<AnonymousRegisterResponse, Box<dyn Error + Send + Sync>> {
        let url = self.endpoint("/auth/anonymous");
        let resp = self
            .http()
            .post(&url)
            .json(payload)
            .send().await?
            .error_for_status()?
            .json::<AnonymousRegisterResponse>().await?;

        info!("Registered anonymous user {}", resp.user_id);
        Ok(resp)
    }
}
