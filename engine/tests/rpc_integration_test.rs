//! RPC client tests against a mock daemon

use mnkeeper_engine::rpc::RpcClient;
use sdk::{MnError, RpcHandleImpl};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> RpcClient {
    RpcClient::new(server.uri(), "user", "pass", Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_successful_call_sends_auth_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .and(body_partial_json(json!({"method": "getinfo", "params": []})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"blocks": 42},
            "error": null,
            "id": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server).call("getinfo", vec![]).await.unwrap();

    assert_eq!(response.result["blocks"], 42);
    assert!(response.error.is_none());

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body["id"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn test_unauthorized_maps_to_authorization_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client(&server).call("getinfo", vec![]).await;
    assert!(matches!(result, Err(MnError::AuthorizationFailed)));
}

#[tokio::test]
async fn test_empty_body_is_no_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let result = client(&server).call("getinfo", vec![]).await;
    assert!(matches!(result, Err(MnError::NoResponse(_))));
}

#[tokio::test]
async fn test_error_status_with_json_body_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "result": null,
            "error": {"code": -28, "message": "Loading block index..."},
            "id": 7
        })))
        .mount(&server)
        .await;

    let response = client(&server).call("getinfo", vec![]).await.unwrap();
    let error = response.error.unwrap();
    assert_eq!(error.code, -28);
    assert_eq!(error.message, "Loading block index...");
    assert_eq!(response.id, Some(7));
}

#[tokio::test]
async fn test_refused_connection_is_transport_unavailable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = RpcClient::new(
        format!("http://127.0.0.1:{}", port),
        "user",
        "pass",
        Duration::from_secs(2),
    )
    .unwrap();

    let result = client.call("getinfo", vec![]).await;
    assert!(matches!(result, Err(MnError::TransportUnavailable(_))));
}
