//! ResponsesClient + pipeline against a stubbed completion service

use std::sync::Arc;
use std::time::Duration;

use integral_lens::clients::ResponsesClient;
use integral_lens::config::UpstreamConfig;
use integral_lens::{LensError, LensPipeline, LensTable};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn upstream_config(server: &MockServer, timeout_ms: u64) -> UpstreamConfig {
    UpstreamConfig {
        base_url: server.uri(),
        timeout_ms,
        ..Default::default()
    }
}

fn pipeline_for(server: &MockServer) -> LensPipeline {
    let client = ResponsesClient::new(&upstream_config(server, 5_000)).expect("client");
    LensPipeline::new(Arc::new(client), Some("test-key".to_string()))
}

#[tokio::test]
async fn sends_bearer_credential_and_separate_input() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4.1-nano",
            "input": "remote work"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "output_text": "X" })))
        .expect(1)
        .mount(&server)
        .await;

    let table = LensTable::default();
    let result = pipeline_for(&server)
        .query(table.get("quadrants").unwrap(), "remote work")
        .await
        .unwrap();
    assert_eq!(result.as_str(), "X");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body["instructions"].as_str().unwrap().contains("\"UL\""));
    assert!(body.get("temperature").is_none());
}

#[tokio::test]
async fn rate_limit_is_upstream_error_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "Rate limit reached", "type": "requests" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let table = LensTable::default();
    let err = pipeline_for(&server)
        .query(table.get("states").unwrap(), "tea")
        .await
        .unwrap_err();
    match err {
        LensError::UpstreamError { status, detail } => {
            assert_eq!(status, 429);
            assert_eq!(detail["message"], "Rate limit reached");
        }
        other => panic!("expected UpstreamError, got {:?}", other),
    }
}

#[tokio::test]
async fn plain_text_error_body_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let table = LensTable::default();
    let err = pipeline_for(&server)
        .query(table.get("levels").unwrap(), "tea")
        .await
        .unwrap_err();
    match err {
        LensError::UpstreamError { status, detail } => {
            assert_eq!(status, 500);
            assert_eq!(detail, json!("upstream API error (500): upstream exploded"));
        }
        other => panic!("expected UpstreamError, got {:?}", other),
    }
}

#[tokio::test]
async fn malformed_success_body_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let table = LensTable::default();
    let err = pipeline_for(&server)
        .query(table.get("levels").unwrap(), "tea")
        .await
        .unwrap_err();
    assert!(matches!(err, LensError::UpstreamUnreachable { .. }));
}

#[tokio::test]
async fn slow_upstream_times_out_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "output_text": "late" }))
                .set_delay(Duration::from_secs(3)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = ResponsesClient::new(&upstream_config(&server, 200)).unwrap();
    let pipeline = LensPipeline::new(Arc::new(client), Some("k".to_string()));
    let table = LensTable::default();
    let err = pipeline
        .query(table.get("levels").unwrap(), "tea")
        .await
        .unwrap_err();
    match err {
        LensError::UpstreamUnreachable { message } => assert!(message.contains("timed out")),
        other => panic!("expected UpstreamUnreachable, got {:?}", other),
    }
}

#[tokio::test]
async fn refused_connection_is_unreachable() {
    let config = UpstreamConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        timeout_ms: 2_000,
        ..Default::default()
    };
    let client = ResponsesClient::new(&config).unwrap();
    let pipeline = LensPipeline::new(Arc::new(client), Some("k".to_string()));
    let table = LensTable::default();
    let err = pipeline
        .query(table.get("levels").unwrap(), "tea")
        .await
        .unwrap_err();
    assert!(matches!(err, LensError::UpstreamUnreachable { .. }));
}
