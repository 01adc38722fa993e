use std::error::Error;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::api::ApiClient;
use crate::api::notes::SortOrder;
use crate::models::ritual::{
    Ritual,
    RitualCheckInPayload,
    RitualPage,
    RitualStatus,
    RitualUpdatePayload,
    UpsertRitualPayload,
    UpsertRitualResponse,
};

#[derive(Deserialize)]
struct ListRitualsResponse {
    rituals: Vec<Ritual>,
}

#[derive(Deserialize)]
struct RitualEnvelope {
    ritual: Ritual,
}

#[derive(Clone, Debug)]
pub struct ListRitualsByStatusParams {
    pub user_id: String,
    pub status: Vec<RitualStatus>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub take: Option<usize>,
    pub cursor: Option<String>,
    pub order: Option<SortOrder>,
}

fn serialize_status(status: &[RitualStatus]) -> String {
    status
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

impl ApiClient {
    /// Creates or replaces the ritual for a given local date and returns it
    /// together with the assistant's reflection on it.
    pub async fn upsert_ritual(
        &self,
        payload: &UpsertRitualPayload
    ) -> Result<UpsertRitualResponse, Box<dyn Error + Send + Sync>> {
        let url = self.endpoint("/rituals/upsert");
        let resp = self
            .authorize(self.http().post(&url)).await
            .json(payload)
            .send().await?
            .error_for_status()?
            .json::<UpsertRitualResponse>().await?;
        Ok(resp)
    }

    pub async fn list_rituals(
        &self,
        user_id: &str
    ) -> Result<Vec<Ritual>, Box<dyn Error + Send + Sync>> {
        let url = self.endpoint("/rituals");
        let resp = self
            .authorize(self.http().get(&url).query(&[("userId", user_id)])).await
            .send().await?
            .error_for_status()?
            .json::<ListRitualsResponse>().await?;
        Ok(resp.rituals)
    }

    pub async fn list_rituals_by_status(
        &self,
        params: &ListRitualsByStatusParams
    ) -> Result<RitualPage, Box<dyn Error + Send + Sync>> {
        let url = self.endpoint("/rituals/status");
        let mut request = self
            .http()
            .get(&url)
            .query(&[
                ("userId", params.user_id.as_str()),
            ])
            .query(&[("status", serialize_status(&params.status))]);

        if let Some(date_from) = &params.date_from {
            request = request.query(&[("dateFrom", date_from.as_str())]);
        }
        if let Some(date_to) = &params.date_to {
            request = request.query(&[("dateTo", date_to.as_str())]);
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
            .json::<RitualPage>().await?;
        Ok(resp)
    }

    /// Records the user's answer to "did you do it?" for today's ritual.
    pub async fn register_ritual_check_in(
        &self,
        user_id: &str,
        payload: &RitualCheckInPayload
    ) -> Result<Ritual, Box<dyn Error + Send + Sync>> {
        let url = self.endpoint(&format!("/rituals/{}/checkin", user_id));
        let resp = self
            .authorize(self.http().post(&url)).await
            .json(payload)
            .send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err("Ritual not found".into());
        }

        let resp = resp.error_for_status()?.json::<RitualEnvelope>().await?;
        Ok(resp.ritual)
    }

    pub async fn update_ritual(
        &self,
        id: &str,
        payload: &RitualUpdatePayload
    ) -> Result<Ritual, Box<dyn Error + Send + Sync>> {
        let url = self.endpoint(&format!("/rituals/{}", id));
        let resp = self
            .authorize(self.http().put(&url)).await
            .json(payload)
            .send().await?
            .error_for_status()?
            .json::<RitualEnvelope>().await?;
        Ok(resp.ritual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_is_comma_joined() {
        assert_eq!(serialize_status(&[RitualStatus::Planned]), "PLANNED");
        assert_eq!(
            serialize_status(&[RitualStatus::Planned, RitualStatus::Completed]),
            "PLANNED,COMPLETED"
        );
    }
}
