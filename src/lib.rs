pub mod api;
pub mod config;
pub mod models;
pub mod redirect;
pub mod shortcode;
pub mod storage;
pub mod validation;

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use config::Config;
use storage::Storage;

/// Full service router: JSON API plus the short-code redirect.
pub fn create_app(storage: Arc<dyn Storage>, config: &Config) -> Router {
    Router::new()
        .merge(api::create_api_router(Arc::clone(&storage), config))
        .merge(redirect::create_redirect_router(storage))
        .layer(TraceLayer::new_for_http())
}
