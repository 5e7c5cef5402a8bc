// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET  /health
// - POST /analyze/text
// - POST /analyze/lyrics
// - POST /analyze/media (disabled + mock AI)
// - debug routes gated by DEBUG_ROUTES

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use serde_json::Value as Json;
use serial_test::serial;
use tower::ServiceExt as _; // for `oneshot`

use discernment_engine::api::{self, AppState};

const BODY_LIMIT: usize = 1024 * 1024;

/// Build the same Router the binary uses.
fn test_router() -> Router {
    let state = AppState::from_env().expect("state from repo config");
    api::router(state)
}

fn post_json(uri: &str, payload: Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST")
}

async fn read_json(resp: axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

#[tokio::test]
#[serial]
async fn health_returns_ok() {
    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = test_router().oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    assert_eq!(String::from_utf8_lossy(&bytes).trim(), "OK");
}

#[tokio::test]
#[serial]
async fn analyze_text_returns_score_and_band() {
    let req = post_json(
        "/analyze/text",
        json!({ "text": "fuck this shit, I wanna kill em" }),
    );
    let resp = test_router().oneshot(req).await.expect("oneshot");
    assert_eq!(resp.status(), StatusCode::OK);

    let v = read_json(resp).await;
    let total = v["total"].as_u64().expect("total");
    assert!(total <= 30, "capped total, got {total}");
    assert_eq!(v["band"], "Concern");
    assert!(v["subscores"]["explicit-language"].as_i64().unwrap() < 0);
    let ids: Vec<&str> = v["hits"]
        .as_array()
        .expect("hits array")
        .iter()
        .filter_map(|h| h["ruleId"].as_str())
        .collect();
    assert!(ids.contains(&"explicit-violence"));
}

#[tokio::test]
#[serial]
async fn analyze_text_empty_is_neutral() {
    let resp = test_router()
        .oneshot(post_json("/analyze/text", json!({ "text": "" })))
        .await
        .expect("oneshot");
    let v = read_json(resp).await;
    assert_eq!(v["total"], 50);
    assert_eq!(v["band"], "Caution");
    assert_eq!(v["hits"], json!([]));
}

#[tokio::test]
#[serial]
async fn analyze_lyrics_returns_report_with_verses() {
    let payload = json!({
        "title": "Holy Forever",
        "artist": "Choir",
        "rawLyrics": "[Chorus]\nWe worship you, holy holy holy"
    });
    let resp = test_router()
        .oneshot(post_json("/analyze/lyrics", payload))
        .await
        .expect("oneshot");
    assert_eq!(resp.status(), StatusCode::OK);

    let v = read_json(resp).await;
    assert_eq!(v["lyricsAvailable"], true);
    assert_eq!(v["meta"]["title"], "Holy Forever");
    assert_eq!(v["analysis"]["band"], "Faith-Safe");
    assert!(v["analysis"]["verses"]["Psalms 95:6"]["text"].is_string());
}

#[tokio::test]
#[serial]
async fn analyze_lyrics_without_text_is_unavailable() {
    let resp = test_router()
        .oneshot(post_json("/analyze/lyrics", json!({ "title": "Untitled" })))
        .await
        .expect("oneshot");
    let v = read_json(resp).await;
    assert_eq!(v["lyricsAvailable"], false);
    assert!(v["message"].is_string());
    assert!(v.get("analysis").is_none());
}

#[tokio::test]
#[serial]
async fn analyze_media_with_ai_disabled_returns_fallback() {
    std::env::remove_var("AI_TEST_MODE");
    let resp = test_router()
        .oneshot(post_json("/analyze/media", json!({ "title": "The Chosen" })))
        .await
        .expect("oneshot");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("x-ai-provider").and_then(|h| h.to_str().ok()),
        Some("disabled")
    );

    let v = read_json(resp).await;
    assert_eq!(v["discernmentScore"], 50);
    assert_eq!(v["tags"], json!(["analysis-error"]));
}

#[tokio::test]
#[serial]
async fn analyze_media_uses_mock_provider_in_test_mode() {
    std::env::set_var("AI_TEST_MODE", "mock");
    let app = test_router();
    std::env::remove_var("AI_TEST_MODE");

    let payload = json!({ "title": "Narnia", "mediaType": "book", "releaseYear": "1950" });
    let resp = app
        .oneshot(post_json("/analyze/media", payload))
        .await
        .expect("oneshot");
    assert_eq!(
        resp.headers().get("x-ai-provider").and_then(|h| h.to_str().ok()),
        Some("mock")
    );

    let v = read_json(resp).await;
    assert_eq!(v["discernmentScore"], 72);
    assert_eq!(v["tags"], json!(["mock"]));
}

#[tokio::test]
#[serial]
async fn debug_routes_are_hidden_by_default() {
    std::env::remove_var("DEBUG_ROUTES");
    let req = Request::builder()
        .method("GET")
        .uri("/debug/rules")
        .body(Body::empty())
        .expect("build GET /debug/rules");
    let resp = test_router().oneshot(req).await.expect("oneshot");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn debug_routes_expose_rules_signals_and_metrics() {
    std::env::set_var("DEBUG_ROUTES", "1");
    let app = test_router();
    std::env::remove_var("DEBUG_ROUTES");

    let req = Request::builder()
        .method("GET")
        .uri("/debug/rules")
        .body(Body::empty())
        .expect("build GET /debug/rules");
    let resp = app.clone().oneshot(req).await.expect("oneshot rules");
    assert_eq!(resp.status(), StatusCode::OK);
    let v = read_json(resp).await;
    assert_eq!(v["count"], 14);
    assert!(v["rules"]
        .as_array()
        .expect("rules")
        .iter()
        .all(|r| r["recognized"] == true));

    let resp = app
        .clone()
        .oneshot(post_json(
            "/debug/signals",
            json!({ "text": "[Verse 1] I PRAISE you Lord" }),
        ))
        .await
        .expect("oneshot signals");
    let v = read_json(resp).await;
    assert_eq!(v["normalized"], "i praise you lord");
    assert_eq!(v["signals"]["themes"], json!(["worship"]));

    // Drive one analysis so the counters exist, then scrape.
    app.clone()
        .oneshot(post_json("/analyze/text", json!({ "text": "holy holy" })))
        .await
        .expect("oneshot analyze");
    let req = Request::builder()
        .method("GET")
        .uri("/metrics")
        .body(Body::empty())
        .expect("build GET /metrics");
    let resp = app.oneshot(req).await.expect("oneshot metrics");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read metrics");
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("discernment_analyses_total"), "{text}");
}
