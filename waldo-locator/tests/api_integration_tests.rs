//! Integration tests for waldo-locator API endpoints
//!
//! Drives the full router in-process with fake collaborators.

mod helpers;

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use helpers::*;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::time::Duration;
use tower::util::ServiceExt;
use waldo_locator::build_router;
use waldo_locator::models::ConfidenceTier;

fn app(behavior: ExtractorBehavior) -> Router {
    build_router(test_state(behavior))
}

fn dc_and_usa() -> ExtractorBehavior {
    ExtractorBehavior::Candidates(vec![
        candidate("USA", ConfidenceTier::High),
        candidate("Washington DC", ConfidenceTier::Medium),
    ])
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let (status, _, bytes) = send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn submit(app: &Router, input: &str) -> String {
    let (status, body) = post_json(app, "/api/extract", json!({ "input": input })).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "starting");
    body["session_id"].as_str().unwrap().to_string()
}

/// Poll the result endpoint until it stops answering 202
async fn wait_for_result(app: &Router, session_id: &str) -> (StatusCode, HeaderMap, Value) {
    let uri = format!("/api/result/{}", session_id);
    for _ in 0..200 {
        let (status, headers, bytes) = get(app, &uri).await;
        if status != StatusCode::ACCEPTED {
            return (status, headers, serde_json::from_slice(&bytes).unwrap());
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job did not finish");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = app(dc_and_usa());
    let (status, _, bytes) = get(&app, "/api/health").await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "waldo");
    assert_eq!(body["active_sessions"], 0);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_submit_validation_errors() {
    let app = app(dc_and_usa());

    let cases = [
        (json!({}), "MISSING_INPUT"),
        (json!("just a string"), "MISSING_INPUT"),
        (json!({ "input": "   " }), "INVALID_INPUT"),
        (json!({ "input": "x".repeat(100_001) }), "INPUT_TOO_LARGE"),
        (json!({ "input": "http://192.168.0.1/admin" }), "URL_NOT_ALLOWED"),
        (json!({ "input": "http://localhost:8080/" }), "URL_NOT_ALLOWED"),
    ];

    for (payload, code) in cases {
        let (status, body) = post_json(&app, "/api/extract", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", code);
        assert_eq!(body["error"]["code"], code);
    }
}

#[tokio::test]
async fn test_submit_without_body() {
    let app = app(dc_and_usa());
    let (status, _, bytes) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/extract")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MISSING_INPUT");
}

#[tokio::test]
async fn test_submit_and_pull_result() {
    let app = app(dc_and_usa());
    let session_id = submit(&app, "Crowds gathered in Washington DC, USA.").await;

    let (status, _, body) = wait_for_result(&app, &session_id).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["article_title"], "Article Text");
    let locations = body["locations"].as_array().unwrap();
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0]["name"], "Washington DC");
    assert_eq!(locations[0]["confidence"], 0.8);
    assert_eq!(locations[0]["events_summary"], "Events reported in Washington DC.");
    assert_eq!(body["warnings"][0]["code"], "SPATIAL_HIERARCHY_FILTERED");
}

#[tokio::test]
async fn test_pending_result_reports_phase() {
    let app = app(ExtractorBehavior::Hang);
    let session_id = submit(&app, "Some text").await;

    let (status, _, bytes) = get(&app, &format!("/api/result/{}", session_id)).await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "processing");
    assert_eq!(body["session_id"], session_id);
    assert!(body["phase"].is_string());
}

#[tokio::test]
async fn test_unknown_session_result() {
    let app = app(dc_and_usa());
    let (status, _, bytes) = get(&app, "/api/result/does-not-exist").await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "UNKNOWN_SESSION");
}

#[tokio::test]
async fn test_rate_limited_result() {
    let app = app(ExtractorBehavior::RateLimited);
    let session_id = submit(&app, "Some text").await;

    let (status, headers, body) = wait_for_result(&app, &session_id).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(headers.get(header::RETRY_AFTER).unwrap(), "60");
    assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");
    assert_eq!(body["error"]["retry_after"], 60);
}

#[tokio::test]
async fn test_cancel_lifecycle() {
    let app = app(ExtractorBehavior::Hang);

    let (status, body) = post_json(&app, "/api/cancel/nope", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "UNKNOWN_SESSION");

    let session_id = submit(&app, "Some text").await;
    let (status, body) = post_json(&app, &format!("/api/cancel/{}", session_id), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelling");

    let (status, _, body) = wait_for_result(&app, &session_id).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "CANCELLED");

    let (status, _) = post_json(&app, &format!("/api/cancel/{}", session_id), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_progress_stream_unknown_session() {
    let app = app(dc_and_usa());
    let (status, headers, bytes) = get(&app, "/api/progress/ghost").await;
    let text = String::from_utf8(bytes).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-cache");
    assert!(text.contains(r#""status":"connected""#));
    assert!(text.contains("Unknown session"));
}

#[tokio::test]
async fn test_progress_stream_replays_history() {
    let app = app(dc_and_usa());
    let session_id = submit(&app, "Crowds gathered in Washington DC, USA.").await;
    let (status, _, _) = wait_for_result(&app, &session_id).await;
    assert_eq!(status, StatusCode::OK);

    // Late observer: job already finished, stream replays and closes
    let (_, headers, bytes) = get(&app, &format!("/api/progress/{}", session_id)).await;
    let text = String::from_utf8(bytes).unwrap();

    assert!(headers
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let order = [
        r#""status":"connected""#,
        r#""status":"starting""#,
        r#""status":"extracting_article""#,
        r#""status":"extracting_locations""#,
        r#""status":"processing_locations""#,
        r#""status":"filtering""#,
        r#""status":"complete""#,
    ];
    let positions: Vec<usize> = order
        .iter()
        .map(|needle| text.find(needle).unwrap_or_else(|| panic!("missing {}", needle)))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(text.matches(r#""status":"complete""#).count(), 1);
}

#[tokio::test]
async fn test_progress_stream_live_with_heartbeats() {
    let app = app(ExtractorBehavior::Hang);
    let session_id = submit(&app, "Some text").await;

    let stream_app = app.clone();
    let stream_uri = format!("/api/progress/{}", session_id);
    let observer = tokio::spawn(async move { get(&stream_app, &stream_uri).await });

    // Let a few heartbeats pass, then end the job
    tokio::time::sleep(Duration::from_millis(100)).await;
    post_json(&app, &format!("/api/cancel/{}", session_id), json!({})).await;

    let (_, _, bytes) = tokio::time::timeout(Duration::from_secs(5), observer)
        .await
        .expect("stream did not close")
        .unwrap();
    let text = String::from_utf8(bytes).unwrap();

    assert!(text.contains(r#""heartbeat":true"#));
    assert!(text.contains(r#""status":"error""#));
    assert!(text.contains("Job cancelled"));
}

#[tokio::test]
async fn test_session_evicted_after_retention() {
    let app = app(dc_and_usa());
    let session_id = submit(&app, "Crowds gathered in Washington DC, USA.").await;
    let (status, _, _) = wait_for_result(&app, &session_id).await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(600)).await;

    let (status, _, _) = get(&app, &format!("/api/result/{}", session_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, _, bytes) = get(&app, "/api/health").await;
    let health: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health["active_sessions"], 0);
}
