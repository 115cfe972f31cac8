//! Tests for the HTTP mirror of the query tools: routing, input rejection,
//! and success mapping against a mocked node.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use mockito::Matcher;
use serde_json::json;
use tower::ServiceExt;

use monad_mcp_server::{
    api::{
        balance::get_balance_handler, block::get_block_handler, health::health_handler,
        tx::get_transaction_handler,
    },
    config::Config,
    AppState,
};

fn test_app(rpc_url: &str) -> Router {
    let config = Config {
        rpc_url: rpc_url.to_string(),
        ..Config::default()
    };
    Router::new()
        .route("/health", get(health_handler))
        .route("/balance/:address", get(get_balance_handler))
        .route("/tx/:hash", get(get_transaction_handler))
        .route("/block/:id", get(get_block_handler))
        .with_state(AppState::new(config))
}

#[tokio::test]
async fn health_returns_ok() {
    let app = test_app("http://127.0.0.1:1");
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(payload["status"], json!("ok"));
}

#[tokio::test]
async fn malformed_address_is_a_bad_request() {
    let app = test_app("http://127.0.0.1:1");
    let response = app
        .oneshot(
            Request::builder()
                .uri("/balance/not-an-address")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_block_id_is_a_bad_request() {
    let app = test_app("http://127.0.0.1:1");
    let response = app
        .oneshot(
            Request::builder()
                .uri("/block/sometime")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn balance_endpoint_returns_the_formatted_amount() {
    let address = "0x00000000219ab540356cbb839cbe05303d7705fa";
    let _m = mockito::mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"method": "eth_getBalance"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"jsonrpc": "2.0", "id": 1, "result": "0x0de0b6b3a7640000"}).to_string(),
        )
        .create();

    let app = test_app(&mockito::server_url());
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/balance/{}", address))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(payload["balance_wei"], json!("1000000000000000000"));
    assert_eq!(payload["balance_mon"], json!("1.000000000000000000"));
}

#[tokio::test]
async fn missing_transaction_is_a_not_found() {
    let hash = "0x33df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a7139433";
    let _m = mockito::mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "method": "eth_getTransactionByHash",
            "params": [hash]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": null}).to_string())
        .create();

    let app = test_app(&mockito::server_url());
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/tx/{}", hash))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
