use http::{header, HeaderMap, HeaderName};

/// Response headers the outbound transport recomputes for the caller.
pub const EXCLUDED_RESPONSE_HEADERS: [HeaderName; 4] = [
    header::CONTENT_ENCODING,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::CONNECTION,
];

/// Request headers the upstream client sets itself once the body is re-encoded.
const CLIENT_MANAGED_REQUEST_HEADERS: [HeaderName; 4] = [
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::CONNECTION,
    header::ACCEPT_ENCODING,
];

/// Every inbound header except `host`, as recorded in the log.
pub fn inbound_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if name != header::HOST {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

/// Headers sent upstream: the logged inbound set minus framing and encoding
/// headers the HTTP client manages.
pub fn upstream_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if name != header::HOST && !CLIENT_MANAGED_REQUEST_HEADERS.contains(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

/// Upstream response headers relayed to the caller, in order, duplicates kept.
pub fn relayed_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if !EXCLUDED_RESPONSE_HEADERS.contains(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}
