use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::ApiError;
use crate::models::{Mapping, ShortenRequest, ShortenResponse, StatsResponse};
use crate::shortcode::{generate_short_code, is_well_formed};
use crate::storage::{Storage, StorageError};
use crate::validation::UrlValidator;

/// Fresh codes drawn before a create gives up on collisions.
pub const MAX_CODE_ATTEMPTS: usize = 5;

pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub validator: UrlValidator,
    /// Configured public base; request headers are used when absent
    pub base_url: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Shorten a URL, reusing the existing mapping when the URL was seen before
pub async fn shorten_url(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<ShortenResponse>, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        // No JSON body at all means no url was sent
        Err(JsonRejection::MissingJsonContentType(_)) => ShortenRequest::default(),
        Err(rejection) => {
            debug!(error = %rejection, "rejected shorten body");
            return Err(ApiError::InvalidBody);
        }
    };

    let candidate = match request.url {
        None => return Err(ApiError::MissingUrl),
        Some(serde_json::Value::String(url)) => url,
        Some(_) => return Err(ApiError::UrlNotString),
    };

    // Store, dedup on and redirect to the parser's serialized form
    let parsed = state.validator.validate(&candidate)?;
    let original_url = parsed.as_str();
    let base_url = state
        .base_url
        .clone()
        .unwrap_or_else(|| request_base_url(&headers));

    if let Some(existing) = state.storage.find_by_original_url(original_url).await? {
        debug!(short_code = %existing.short_code, "reusing existing mapping");
        return Ok(Json(ShortenResponse::from_mapping(existing, &base_url)));
    }

    let mapping = insert_with_fresh_code(state.storage.as_ref(), original_url).await?;
    info!(short_code = %mapping.short_code, "created short URL");

    Ok(Json(ShortenResponse::from_mapping(mapping, &base_url)))
}

async fn insert_with_fresh_code(
    storage: &dyn Storage,
    original_url: &str,
) -> Result<Mapping, ApiError> {
    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let short_code = generate_short_code();
        match storage.insert(&short_code, original_url).await {
            Ok(mapping) => return Ok(mapping),
            Err(StorageError::DuplicateCode) => {
                warn!(attempt, short_code = %short_code, "short code collision, drawing another");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(ApiError::Internal(anyhow::anyhow!(
        "no free short code after {MAX_CODE_ATTEMPTS} attempts"
    )))
}

/// Usage info for a short code
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<StatsResponse>, ApiError> {
    if !is_well_formed(&code) {
        return Err(ApiError::NotFound);
    }

    match state.storage.find_by_short_code(&code).await? {
        Some(mapping) => Ok(Json(mapping.into())),
        None => Err(ApiError::NotFound),
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
    })
}

/// `<proto>://<host>` as seen by the client, honoring reverse-proxy headers
pub fn request_base_url(headers: &HeaderMap) -> String {
    let proto = header_value(headers, "x-forwarded-proto")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("http");

    let host = header_value(headers, "x-forwarded-host")
        .or_else(|| header_value(headers, header::HOST.as_str()))
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("localhost");

    format!("{proto}://{host}")
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
