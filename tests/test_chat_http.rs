//! Chat client wire format over the real reqwest transport.

mod common;

use std::sync::Arc;
use std::time::Duration;

use workplace_rca::config::Credential;
use workplace_rca::llm::{ChatClient, ChatModel, MessageContent, ReqwestTransport};

use common::stub_server;

fn client(base: &str) -> ChatClient {
    let transport = ReqwestTransport::new(Some(Duration::from_secs(10))).unwrap();
    ChatClient::new(
        Arc::new(transport),
        format!("{}/openai/v1/chat/completions", base),
        "vision-model",
    )
}

#[test]
fn image_request_carries_bearer_and_data_uri() {
    let reply = serde_json::json!({"choices": [{"message": {"content": "Critical: exposed wiring"}}]});
    let (url, server) = stub_server::serve_once(200, reply.to_string().into_bytes());
    let key = Credential::new("gsk_test_1234").unwrap();

    let text = client(&url)
        .complete(
            &key,
            MessageContent::TextWithImage {
                text: "Analyze this workplace image".to_string(),
                image_data_uri: "data:image/jpeg;base64,QUJD".to_string(),
            },
        )
        .unwrap();
    assert_eq!(text, "Critical: exposed wiring");

    let request = server.join().unwrap();
    assert_eq!(request.request_line, "POST /openai/v1/chat/completions HTTP/1.1");
    assert_eq!(request.header("authorization"), Some("Bearer gsk_test_1234"));
    assert_eq!(request.header("content-type"), Some("application/json"));

    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body["model"], "vision-model");
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    let parts = &body["messages"][0]["content"];
    assert_eq!(parts[0]["type"], "text");
    assert_eq!(parts[1]["type"], "image_url");
    assert_eq!(parts[1]["image_url"]["url"], "data:image/jpeg;base64,QUJD");
}

#[test]
fn rejected_key_is_an_auth_error() {
    let (url, server) = stub_server::serve_once(401, br#"{"error":{"message":"Invalid API Key"}}"#.to_vec());
    let key = Credential::new("bad").unwrap();

    let err = client(&url)
        .complete(&key, MessageContent::Text("hello".to_string()))
        .unwrap_err();
    server.join().unwrap();
    assert_eq!(err.category(), "auth");
}

#[test]
fn server_error_is_an_api_error_with_status() {
    let (url, server) = stub_server::serve_once(503, b"over capacity".to_vec());
    let key = Credential::new("k").unwrap();

    let err = client(&url)
        .complete(&key, MessageContent::Text("hello".to_string()))
        .unwrap_err();
    server.join().unwrap();
    assert_eq!(err.category(), "api");
    assert_eq!(err.status_code(), Some(503));
    assert!(err.to_string().contains("over capacity"));
}
