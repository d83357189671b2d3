//! Re-emission of forwarded-port headers on outbound calls.

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::forwarding::context::RequestScopeContext;

/// Build outbound headers from every context entry except `exclude_key`.
///
/// The excluded key is the one consumed to pick the current target port, so
/// the next hop only sees the ports meant for services further down.
pub fn outbound_headers(context: &RequestScopeContext, exclude_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (key, port) in context.get_attributes_excluding(exclude_key) {
        let name = match HeaderName::from_bytes(key.as_bytes()) {
            Ok(name) => name,
            Err(_) => {
                tracing::warn!(key = %key, "Skipping forwarded port with invalid header name");
                continue;
            }
        };
        tracing::info!(key = %key, port, "Port forwarded");
        headers.insert(name, HeaderValue::from(port));
    }
    headers
}
