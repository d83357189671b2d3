//! Forwarded-port filter.
//!
//! Runs before every handler: each `*-forwarded-port` header is validated and
//! the valid ones land in a fresh [`RequestScopeContext`] attached to the
//! request extensions. The context is cleared when the scope guard drops,
//! which also happens when the handler fails or the request is cancelled.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::forwarding::{ContextScope, HeaderValidator, RequestScopeContext, ValidationOutcome};
use crate::observability::metrics;

pub async fn forwarded_port_filter(
    State(validator): State<Arc<HeaderValidator>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();
    let scope = ContextScope::new();
    let context = scope.context();

    tracing::debug!(
        method = %req.method(),
        path = %req.uri().path(),
        headers = ?req.headers().keys().map(|k| k.as_str()).collect::<Vec<_>>(),
        "Processing request"
    );

    let accepted = populate(&validator, &context, req.headers());
    req.extensions_mut().insert(context);

    let response = next.run(req).await;

    tracing::debug!(
        accepted,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Request completed"
    );
    drop(scope);
    response
}

/// Validate every candidate header and store the valid ones.
///
/// Returns the number of entries stored. Only the first value of a repeated
/// header is considered.
pub fn populate(validator: &HeaderValidator, context: &RequestScopeContext, headers: &HeaderMap) -> usize {
    let mut accepted = 0;
    for name in headers.keys() {
        let name = name.as_str();
        if !validator.is_candidate(name) {
            continue;
        }
        let raw = headers.get(name).and_then(|v| v.to_str().ok());
        match validator.validate(name, raw) {
            ValidationOutcome::Valid(port) => {
                metrics::record_validation("valid");
                if context.set_attribute(name, port) {
                    accepted += 1;
                }
            }
            ValidationOutcome::Invalid(reason) => {
                metrics::record_validation(reason.as_str());
                tracing::warn!(header = name, value = raw.unwrap_or_default(), %reason, "Invalid port header");
            }
        }
    }
    accepted
}
