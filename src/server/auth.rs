//! Shared-secret check for protected endpoints

use super::error::ApiError;
use crate::error::MergeError;
use crate::service::MergeService;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

pub const API_KEY_HEADER: &str = "x-merge-api-key";

/// Proof that the request carried the configured API key
///
/// Runs before any body extractor, so an unauthenticated request is rejected
/// without its body being read or any image being fetched.
#[derive(Debug, Clone, Copy)]
pub struct Authorized;

/// Token from `x-merge-api-key`, falling back to `Authorization`
///
/// Whitespace is trimmed and a leading `Bearer ` is removed. Returns an empty
/// string when neither header is present.
pub fn extract_token(headers: &HeaderMap) -> &str {
    let raw = [API_KEY_HEADER, "authorization"]
        .into_iter()
        .filter_map(|name| headers.get(name))
        .filter_map(|value| value.to_str().ok())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or_default();
    raw.strip_prefix("Bearer ").unwrap_or(raw)
}

/// Compare without exiting early on the first differing byte
fn keys_match(presented: &str, expected: &str) -> bool {
    let (presented, expected) = (presented.as_bytes(), expected.as_bytes());
    presented.len() == expected.len()
        && presented
            .iter()
            .zip(expected)
            .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Check request headers against the configured key
///
/// # Errors
/// `MergeError::Auth` when the key is missing or does not match.
pub fn authorize(headers: &HeaderMap, expected: &str) -> Result<Authorized, MergeError> {
    let token = extract_token(headers);
    if token.is_empty() {
        return Err(MergeError::auth("Missing merge API key"));
    }
    if !keys_match(token, expected) {
        return Err(MergeError::auth("Invalid merge API key"));
    }
    Ok(Authorized)
}

#[async_trait]
impl FromRequestParts<MergeService> for Authorized {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, service: &MergeService) -> Result<Self, Self::Rejection> {
        authorize(&parts.headers, service.api_key()).map_err(ApiError::from)
    }
}
