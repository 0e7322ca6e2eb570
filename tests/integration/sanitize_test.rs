use super::common::{wait_for_logs, log_files, read_log, MockUpstream, TestGateway};
use chat_log_proxy::sanitizer::{PayloadSanitizer, SanitizeError};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

fn request_with_contaminated_tool() -> Value {
    json!({
        "model": "deepseek-chat",
        "messages": [{"role": "user", "content": "list files"}],
        "tools": [{
            "type": "function",
            "function": {
                "name": "f",
                "description": "d",
                "parameters": {},
                "strict": true,
                "extra": 1
            }
        }]
    })
}

struct FailingSanitizer;

impl PayloadSanitizer for FailingSanitizer {
    fn sanitize(&self, body: &mut Value) -> Result<usize, SanitizeError> {
        body["tools"] = Value::Null;
        Err(SanitizeError::Failed("simulated failure".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Turns every request into a streaming one.
struct ForceStreaming;

impl PayloadSanitizer for ForceStreaming {
    fn sanitize(&self, body: &mut Value) -> Result<usize, SanitizeError> {
        body["stream"] = Value::Bool(true);
        Ok(1)
    }

    fn name(&self) -> &str {
        "force-streaming"
    }
}

#[tokio::test]
async fn upstream_receives_repaired_tools_while_log_keeps_original() {
    let upstream = MockUpstream::start().await;
    let gateway = TestGateway::start(&upstream.base_url()).await;

    let response = Client::new()
        .post(gateway.url("/v1/chat/completions"))
        .json(&request_with_contaminated_tool())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let forwarded = upstream.last_request().await.body;
    assert_eq!(
        forwarded["tools"][0],
        json!({
            "type": "function",
            "function": {"name": "f", "description": "d", "parameters": {}}
        })
    );

    let log = read_log(&log_files(gateway.log_dir())[0]);
    assert_eq!(log["request"]["body"], request_with_contaminated_tool());
}

#[test_log::test(tokio::test)]
async fn failed_sanitization_forwards_the_original_body() {
    let upstream = MockUpstream::start().await;
    let gateway =
        TestGateway::start_with(&upstream.base_url(), |state| state.with_sanitizer(FailingSanitizer))
            .await;

    let response = Client::new()
        .post(gateway.url("/v1/chat/completions"))
        .json(&request_with_contaminated_tool())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(upstream.last_request().await.body, request_with_contaminated_tool());
    assert_eq!(log_files(gateway.log_dir()).len(), 1);
}

#[tokio::test]
async fn streaming_mode_is_read_from_the_sanitized_payload() {
    let upstream = MockUpstream::start().await;
    let gateway =
        TestGateway::start_with(&upstream.base_url(), |state| state.with_sanitizer(ForceStreaming))
            .await;

    let response = Client::new()
        .post(gateway.url("/v1/chat/completions"))
        .json(&json!({"model": "deepseek-chat", "messages": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"abcdef");

    let logs = wait_for_logs(gateway.log_dir(), 1).await;
    assert_eq!(logs[0]["response"]["body"], "abcdef");
    assert!(logs[0]["request"]["body"].get("stream").is_none());
}
