use serde::{ Serialize, Deserialize };

use crate::locale::LanguageCode;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousRegisterPayload {
    pub locale: LanguageCode,
    pub time_zone: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousRegisterResponse {
    pub user_id: String,
    pub token: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub ts: String,
    pub message: String,
}
