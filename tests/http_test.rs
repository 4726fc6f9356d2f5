mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use cohort::http::{AppState, HttpServer};
use cohort::config::EmbeddingConfig;
use cohort::{visualize, QueryService, VectorEncoder, VisualizeOptions};
use common::{abc_profiles, topic_encoder, unreachable_encoder};
use http_body_util::BodyExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use tower::ServiceExt;

fn state() -> AppState {
    let profiles = abc_profiles();
    let service = QueryService::new(topic_encoder());
    let index = service.index_profiles(&profiles).unwrap();
    let vis = visualize(
        &profiles,
        &topic_encoder(),
        &VisualizeOptions::default(),
        &mut StdRng::seed_from_u64(5),
    )
    .unwrap();
    AppState::new(service, index, vis, 5)
}

fn post_query(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/query")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = HttpServer::router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(state, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_query_returns_ranked_pairs() {
    let (status, body) = send_json(state(), post_query(r#"{"query": "biology"}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let matches = body["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 3);
    assert_eq!(matches[0][0], "Chiara Costa");
    assert!(matches[0][1].as_f64().unwrap() > 0.99);
}

#[tokio::test]
async fn test_missing_query_is_bad_request() {
    for body in [r#"{}"#, r#"{"query": ""}"#, r#"{"query": "   "}"#] {
        let (status, json) = send_json(state(), post_query(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
        assert_eq!(json["error"], "No query provided");
    }
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (status, json) = send_json(state(), post_query("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_unreachable_model_is_service_unavailable() {
    let healthy = state();
    let broken = AppState {
        service: std::sync::Arc::new(QueryService::new(unreachable_encoder())),
        ..healthy
    };

    let (status, json) = send_json(broken, post_query(r#"{"query": "economics"}"#)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json["error"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_query_without_words_is_bad_request() {
    let healthy = state();
    let service = QueryService::new(VectorEncoder::from_config(&EmbeddingConfig::default()).unwrap());
    let index = service.index_profiles(&abc_profiles()).unwrap();
    let hashing = AppState {
        service: std::sync::Arc::new(service),
        index: std::sync::Arc::new(index),
        ..healthy
    };

    let (status, json) = send_json(hashing, post_query(r#"{"query": "???"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Query has no searchable content");
}

#[tokio::test]
async fn test_graph_endpoint() {
    let request = Request::builder().uri("/api/graph").body(Body::empty()).unwrap();
    let (status, json) = send_json(state(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(json["communities"], 2);
    assert_eq!(json["edges"][0]["from"], 0);
}

#[tokio::test]
async fn test_status_endpoint() {
    let request = Request::builder().uri("/api/status").body(Body::empty()).unwrap();
    let (status, json) = send_json(state(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["profiles"], 3);
    assert_eq!(json["model"], "topics");
}

#[tokio::test]
async fn test_index_page_served() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, bytes) = send(state(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&bytes).contains("/api/query"));
}
