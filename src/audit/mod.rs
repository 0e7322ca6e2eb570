//! On-disk audit trail: one JSON file per proxied exchange.

pub mod writer;

pub use writer::{init_log_dir, LogWriteError, LogWriter};

use chrono::Local;
use http::HeaderMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// Local wall-clock time, ISO-8601 without offset, microsecond precision.
pub fn timestamp_now() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Flattens a header map for the log. Repeated headers are joined with `", "`.
pub fn headers_to_map(headers: &HeaderMap) -> Map<String, Value> {
    let mut map = Map::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        map.insert(name.as_str().to_string(), Value::String(joined));
    }
    map
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestLog {
    pub method: String,
    pub url: String,
    pub headers: Map<String, Value>,
    /// The body as the client sent it, before any repair.
    pub body: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResponseLog {
    Completed {
        status_code: u16,
        headers: Map<String, Value>,
        body: Value,
    },
    Failed {
        error: String,
    },
}

/// The part of a log record known before the upstream call is made.
#[derive(Debug, Clone)]
pub struct PendingLog {
    timestamp_start: String,
    request: RequestLog,
}

impl PendingLog {
    pub fn start(request: RequestLog) -> Self {
        Self {
            timestamp_start: timestamp_now(),
            request,
        }
    }

    /// Closes the record with the given outcome, stamping the end time.
    pub fn finish(self, response: ResponseLog) -> LogRecord {
        LogRecord {
            timestamp_start: self.timestamp_start,
            request: self.request,
            response,
            timestamp_end: timestamp_now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp_start: String,
    pub request: RequestLog,
    pub response: ResponseLog,
    pub timestamp_end: String,
}
