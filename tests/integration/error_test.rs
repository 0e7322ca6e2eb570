use super::common::{chat_request, log_files, refused_upstream, wait_for_logs, MockUpstream, TestGateway};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

async fn assert_rejected(gateway: &TestGateway, body: &'static str) {
    let response = Client::new()
        .post(gateway.url("/v1/chat/completions"))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body:?}");
    let payload: Value = response.json().await.unwrap();
    assert_eq!(payload, json!({"error": "Request body must be JSON"}));
}

#[tokio::test]
async fn empty_or_invalid_bodies_are_rejected_without_logging() {
    let upstream = MockUpstream::start().await;
    let gateway = TestGateway::start(&upstream.base_url()).await;

    for body in ["", "{}", "not json", "null"] {
        assert_rejected(&gateway, body).await;
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(log_files(gateway.log_dir()).is_empty());
    assert!(upstream.requests().await.is_empty());
}

#[test_log::test(tokio::test)]
async fn connection_refused_returns_bad_gateway_and_logs_error() {
    let gateway = TestGateway::start(&refused_upstream()).await;

    let response = Client::new()
        .post(gateway.url("/v1/chat/completions"))
        .json(&chat_request(false))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let payload: Value = response.json().await.unwrap();
    let message = payload["error"].as_str().expect("error field");
    assert!(message.starts_with("Error forwarding request to upstream API"));

    let files = log_files(gateway.log_dir());
    assert_eq!(files.len(), 1);
    let log = super::common::read_log(&files[0]);
    assert_eq!(log["response"]["error"], message);
    assert!(log["response"].get("status_code").is_none());
    assert_eq!(log["request"]["body"], chat_request(false));
}

#[tokio::test]
async fn upstream_timeout_returns_bad_gateway_and_logs_error() {
    let upstream = MockUpstream::start().await;
    let gateway =
        TestGateway::start_with_timeout(&upstream.base_url(), Duration::from_millis(300)).await;

    let response = Client::new()
        .post(gateway.url("/slow"))
        .json(&chat_request(false))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let payload: Value = response.json().await.unwrap();
    let message = payload["error"].as_str().expect("error field");
    assert!(message.starts_with("Error forwarding request to upstream API"));

    let files = log_files(gateway.log_dir());
    assert_eq!(files.len(), 1);
    let log = super::common::read_log(&files[0]);
    assert_eq!(log["response"]["error"], message);
    assert!(log["response"].get("status_code").is_none());
}

#[tokio::test]
async fn json_body_is_accepted_whatever_the_content_type() {
    let upstream = MockUpstream::start().await;
    let gateway = TestGateway::start(&upstream.base_url()).await;

    let response = Client::new()
        .post(gateway.url("/v1/chat/completions"))
        .header("content-type", "text/plain")
        .body(chat_request(false).to_string())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(upstream.last_request().await.body, chat_request(false));
    assert_eq!(log_files(gateway.log_dir()).len(), 1);
}

#[tokio::test]
async fn upstream_error_status_is_a_bad_gateway() {
    let upstream = MockUpstream::start().await;
    let gateway = TestGateway::start(&upstream.base_url()).await;

    let response = Client::new()
        .post(gateway.url("/error"))
        .json(&chat_request(false))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let logs = wait_for_logs(gateway.log_dir(), 1).await;
    let error = logs[0]["response"]["error"].as_str().unwrap();
    assert!(error.contains("500"), "error was {error}");
}

#[tokio::test]
async fn streaming_request_against_failing_upstream_is_logged_once() {
    let upstream = MockUpstream::start().await;
    let gateway = TestGateway::start(&upstream.base_url()).await;

    let response = Client::new()
        .post(gateway.url("/error"))
        .json(&chat_request(true))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(log_files(gateway.log_dir()).len(), 1);
}

#[tokio::test]
async fn non_json_upstream_body_is_logged_before_failing() {
    let upstream = MockUpstream::start().await;
    let gateway = TestGateway::start(&upstream.base_url()).await;

    let response = Client::new()
        .post(gateway.url("/not-json"))
        .json(&chat_request(false))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let files = log_files(gateway.log_dir());
    assert_eq!(files.len(), 1);
    let log = super::common::read_log(&files[0]);
    assert!(log["response"]["error"]
        .as_str()
        .unwrap()
        .starts_with("Upstream returned a non-JSON body"));
}

#[tokio::test]
async fn only_post_is_proxied() {
    let upstream = MockUpstream::start().await;
    let gateway = TestGateway::start(&upstream.base_url()).await;

    let response = Client::new()
        .get(gateway.url("/v1/models"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(upstream.requests().await.is_empty());
}
