use super::auth::Authorized;
use super::error::ApiError;
use crate::error::MergeError;
use crate::service::MergeService;
use crate::types::ThresholdParam;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    pub upper_url: Option<String>,
    pub lower_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResponse {
    pub merged_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBackgroundRequest {
    pub image_url: Option<String>,
    pub threshold: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBackgroundResponse {
    pub processed_url: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::from(MergeError::validation(rejection.body_text())))
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn merge_clothes(
    _auth: Authorized,
    State(service): State<MergeService>,
    payload: Result<Json<MergeRequest>, JsonRejection>,
) -> Result<Json<MergeResponse>, ApiError> {
    let request = body(payload)?;
    let (Some(upper_url), Some(lower_url)) = (non_empty(request.upper_url), non_empty(request.lower_url)) else {
        return Err(MergeError::validation("upperUrl and lowerUrl required").into());
    };

    let merged_url = service.merge_clothes(&upper_url, &lower_url).await?;
    Ok(Json(MergeResponse { merged_url }))
}

pub async fn remove_background(
    _auth: Authorized,
    State(service): State<MergeService>,
    payload: Result<Json<RemoveBackgroundRequest>, JsonRejection>,
) -> Result<Json<RemoveBackgroundResponse>, ApiError> {
    let request = body(payload)?;
    let Some(image_url) = non_empty(request.image_url) else {
        return Err(MergeError::validation("imageUrl required").into());
    };
    let threshold = request
        .threshold
        .map(ThresholdParam::try_from)
        .transpose()?
        .unwrap_or_default();

    let processed_url = service.remove_background(&image_url, threshold).await?;
    Ok(Json(RemoveBackgroundResponse { processed_url }))
}
