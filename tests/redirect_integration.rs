//! Redirect integration tests
//!
//! These tests verify that redirects resolve to the stored URL and that
//! click counting holds up under concurrent traffic.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use shrinkray::config::Config;
use shrinkray::redirect;
use shrinkray::storage::{SqliteStorage, Storage};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Helper to create test storage
async fn create_test_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 5).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

fn default_config() -> Config {
    Config::from_lookup(|_| None).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Click increments are detached from the response, so poll until the
/// expected count lands or give up.
async fn wait_for_clicks(storage: &Arc<dyn Storage>, code: &str, expected: i64) -> i64 {
    let mut clicks = 0;
    for _ in 0..100 {
        clicks = storage
            .find_by_short_code(code)
            .await
            .unwrap()
            .map(|m| m.click_count)
            .unwrap_or(0);
        if clicks >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    clicks
}

async fn shorten(app: &Router, url: &str) -> Value {
    let request = Request::builder()
        .method("POST")
        .uri("/api/shorten")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({ "url": url }).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn test_redirect_to_original_url() {
    let storage = create_test_storage().await;
    storage
        .insert("redir001", "https://example.com/destination")
        .await
        .unwrap();

    let app = redirect::create_redirect_router(Arc::clone(&storage));
    let response = app.oneshot(get("/redir001")).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://example.com/destination"
    );

    assert_eq!(wait_for_clicks(&storage, "redir001", 1).await, 1);
}

#[tokio::test]
async fn test_shorten_then_redirect_round_trip() {
    let storage = create_test_storage().await;
    let app = shrinkray::create_app(Arc::clone(&storage), &default_config());

    let created = shorten(&app, "https://example.com/path").await;
    let code = created["shortCode"].as_str().unwrap();

    let response = app.clone().oneshot(get(&format!("/{code}"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://example.com/path"
    );
}

#[tokio::test]
async fn test_url_with_embedded_newline_still_redirects() {
    let storage = create_test_storage().await;
    let app = shrinkray::create_app(Arc::clone(&storage), &default_config());

    let created = shorten(&app, "https://example.com/a\nb").await;
    let code = created["shortCode"].as_str().unwrap();
    assert_eq!(created["originalUrl"], "https://example.com/ab");

    let response = app.clone().oneshot(get(&format!("/{code}"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://example.com/ab"
    );
}

#[tokio::test]
async fn test_non_ascii_url_redirects_encoded() {
    let storage = create_test_storage().await;
    let app = shrinkray::create_app(Arc::clone(&storage), &default_config());

    let created = shorten(&app, "https://example.com/café").await;
    let code = created["shortCode"].as_str().unwrap();
    assert_eq!(created["originalUrl"], "https://example.com/caf%C3%A9");

    let response = app.clone().oneshot(get(&format!("/{code}"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://example.com/caf%C3%A9"
    );
}

#[tokio::test]
async fn test_unicode_and_punycode_hosts_share_a_code() {
    let storage = create_test_storage().await;
    let app = shrinkray::create_app(Arc::clone(&storage), &default_config());

    let unicode = shorten(&app, "https://exämple.com/path").await;
    let punycode = shorten(&app, "https://xn--exmple-cua.com/path").await;

    assert_eq!(unicode["shortCode"], punycode["shortCode"]);
    assert_eq!(unicode["originalUrl"], "https://xn--exmple-cua.com/path");

    let code = unicode["shortCode"].as_str().unwrap();
    let response = app.clone().oneshot(get(&format!("/{code}"))).await.unwrap();
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://xn--exmple-cua.com/path"
    );
}

#[tokio::test]
async fn test_redirect_unknown_code_is_plain_text_404() {
    let storage = create_test_storage().await;
    let app = shrinkray::create_app(Arc::clone(&storage), &default_config());

    for uri in ["/nOtThErE", "/short"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(content_type.starts_with("text/plain"), "got {content_type}");
        assert_eq!(body_text(response).await, "Short URL not found");
    }
}

#[tokio::test]
async fn test_concurrent_redirects_count_every_click() {
    let storage = create_test_storage().await;
    storage
        .insert("burst001", "https://example.com/popular")
        .await
        .unwrap();

    let app = shrinkray::create_app(Arc::clone(&storage), &default_config());

    const REDIRECTS: i64 = 50;
    let mut handles = vec![];
    for _ in 0..REDIRECTS {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            app.oneshot(get("/burst001")).await.unwrap().status()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::FOUND);
    }

    assert_eq!(wait_for_clicks(&storage, "burst001", REDIRECTS).await, REDIRECTS);

    let response = app.oneshot(get("/api/stats/burst001")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stats: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(stats["clickCount"], REDIRECTS);
}

#[tokio::test]
async fn test_repeat_shorten_reports_clicks_from_redirects() {
    let storage = create_test_storage().await;
    let app = shrinkray::create_app(Arc::clone(&storage), &default_config());

    let first = shorten(&app, "https://example.com/history").await;
    let code = first["shortCode"].as_str().unwrap().to_string();
    assert_eq!(first["clickCount"], 0);

    for _ in 0..3 {
        let response = app.clone().oneshot(get(&format!("/{code}"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
    }
    assert_eq!(wait_for_clicks(&storage, &code, 3).await, 3);

    let second = shorten(&app, "https://example.com/history").await;
    assert_eq!(second["shortCode"], code.as_str());
    assert_eq!(second["clickCount"], 3);
}

#[tokio::test]
async fn test_stats_lookup_does_not_count_clicks() {
    let storage = create_test_storage().await;
    storage
        .insert("quiet001", "https://example.com/quiet")
        .await
        .unwrap();
    let app = shrinkray::create_app(Arc::clone(&storage), &default_config());

    for _ in 0..3 {
        let response = app.clone().oneshot(get("/api/stats/quiet001")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    let mapping = storage.find_by_short_code("quiet001").await.unwrap().unwrap();
    assert_eq!(mapping.click_count, 0);
}
