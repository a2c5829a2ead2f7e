use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::config::Config;
use crate::storage::Storage;
use crate::validation::UrlValidator;

use super::handlers::{get_stats, health_check, shorten_url, AppState};

pub fn create_api_router(storage: Arc<dyn Storage>, config: &Config) -> Router {
    let mut validator = UrlValidator::new();
    if let Some(host) = config.public_host() {
        validator = validator.with_blocked_domain(host);
    }

    let state = Arc::new(AppState {
        storage,
        validator,
        base_url: config.base_url.clone(),
    });

    Router::new()
        .route("/health", get(health_check))
        .route("/api/shorten", post(shorten_url))
        .route("/api/stats/{code}", get(get_stats))
        .with_state(state)
}
