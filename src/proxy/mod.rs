use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, HeaderMap, HeaderValue, Request, Response, StatusCode},
};
use serde_json::Value;
use tracing::{debug, error};

use crate::{
    audit::{headers_to_map, PendingLog, RequestLog, ResponseLog},
    error::AppError,
    sanitizer::PayloadSanitizer,
    state::AppState,
};

pub mod client;
pub mod headers;
pub mod relay;

/// Forwards one inbound call upstream and writes its log record.
///
/// Calls rejected before anything is sent upstream (an unreadable or empty
/// body) are not logged. Every other outcome produces exactly one record.
pub async fn proxy_request_to_upstream(
    state: &AppState,
    request: Request<Body>,
) -> Result<Response<Body>, AppError> {
    let (parts, body) = request.into_parts();

    let url = format!("{}{}", state.config.upstream_base_url, parts.uri.path());
    let inbound_headers = headers::inbound_headers(&parts.headers);
    let upstream_headers = headers::upstream_request_headers(&inbound_headers);

    let body_bytes = to_bytes(body, usize::MAX).await?;
    let original = decode_body(&body_bytes)?;

    let pending = PendingLog::start(RequestLog {
        method: parts.method.to_string(),
        url: url.clone(),
        headers: headers_to_map(&inbound_headers),
        body: original.clone(),
    });

    let payload = sanitize_payload(state.sanitizer.as_ref(), original);
    let is_streaming = payload.get("stream").map_or(false, is_truthy);
    debug!(url = %url, streaming = is_streaming, "Forwarding request upstream");

    let upstream = match send_upstream(&state.client, &url, upstream_headers, &payload).await {
        Ok(response) => response,
        Err(e) => return Err(log_failure(state, pending, AppError::upstream(e)).await),
    };

    let status = upstream.status();
    let relayed_headers = headers::relayed_response_headers(upstream.headers());

    if is_streaming {
        let body = relay::relay_stream(upstream, pending, state.log_writer.clone());
        return build_response(status, relayed_headers, body);
    }

    let upstream_headers = headers_to_map(upstream.headers());
    let bytes = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => return Err(log_failure(state, pending, AppError::upstream(e)).await),
    };
    let body: Value = match serde_json::from_slice(&bytes) {
        Ok(body) => body,
        Err(e) => {
            let err = AppError::InvalidUpstreamBody(format!("Upstream returned a non-JSON body: {}", e));
            return Err(log_failure(state, pending, err).await);
        }
    };

    // serde_json leaves non-ASCII characters unescaped
    let encoded = Bytes::from(body.to_string());

    let record = pending.finish(ResponseLog::Completed {
        status_code: status.as_u16(),
        headers: upstream_headers,
        body,
    });
    state.log_writer.write(&record).await;

    let mut response_headers = relayed_headers;
    response_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    build_response(status, response_headers, Body::from(encoded))
}

/// Decodes the inbound body, rejecting anything that is not JSON or decodes to an empty value.
fn decode_body(bytes: &[u8]) -> Result<Value, AppError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) if is_truthy(&value) => Ok(value),
        _ => Err(AppError::InvalidJson),
    }
}

/// JSON truthiness: `null`, `false`, zero and empty strings/arrays/objects are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Runs the sanitizer on a working copy, falling back to `original` if it fails.
fn sanitize_payload(sanitizer: &dyn PayloadSanitizer, original: Value) -> Value {
    let mut working = original.clone();
    match sanitizer.sanitize(&mut working) {
        Ok(_) => working,
        Err(e) => {
            error!(
                sanitizer = sanitizer.name(),
                "Error fixing request body, forwarding it unmodified: {}", e
            );
            original
        }
    }
}

async fn send_upstream(
    client: &reqwest::Client,
    url: &str,
    headers: HeaderMap,
    payload: &Value,
) -> Result<reqwest::Response, reqwest::Error> {
    client
        .post(url)
        .headers(headers)
        .json(payload)
        .send()
        .await?
        .error_for_status()
}

async fn log_failure(state: &AppState, pending: PendingLog, err: AppError) -> AppError {
    error!("{}", err);
    let record = pending.finish(ResponseLog::Failed {
        error: err.to_string(),
    });
    state.log_writer.write(&record).await;
    err
}

fn build_response(
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
) -> Result<Response<Body>, AppError> {
    let mut response = Response::builder().status(status).body(body)?;
    *response.headers_mut() = headers;
    Ok(response)
}
