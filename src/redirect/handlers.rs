use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::shortcode::is_well_formed;
use crate::storage::Storage;

const NOT_FOUND_BODY: &str = "Short URL not found";
const INTERNAL_ERROR_BODY: &str = "Internal server error";

pub struct RedirectState {
    pub storage: Arc<dyn Storage>,
}

/// Redirect to original URL, counting the click in the background
pub async fn redirect_url(
    State(state): State<Arc<RedirectState>>,
    Path(code): Path<String>,
) -> Response {
    if !is_well_formed(&code) {
        return (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response();
    }

    let mapping = match state.storage.find_by_short_code(&code).await {
        Ok(Some(mapping)) => mapping,
        Ok(None) => return (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response(),
        Err(err) => {
            tracing::error!(short_code = %code, error = ?err, "redirect lookup failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response();
        }
    };

    let location = match HeaderValue::from_str(&mapping.original_url) {
        Ok(location) => location,
        Err(err) => {
            tracing::error!(short_code = %code, error = %err, "stored URL is not a valid Location header");
            return (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response();
        }
    };

    record_click(Arc::clone(&state.storage), code);

    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Fire-and-forget click increment. The redirect never waits on it and a
/// failure only costs one click.
pub fn record_click(storage: Arc<dyn Storage>, short_code: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(err) = storage.increment_clicks(&short_code).await {
            tracing::warn!(short_code = %short_code, error = %err, "failed to record click");
        }
    })
}
