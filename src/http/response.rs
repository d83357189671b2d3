//! Response handling.
//!
//! # Responsibilities
//! - Relay a successful outbound result to the inbound caller
//! - Map decision and outbound failures to HTTP status codes
//!
//! # Status mapping
//! - Missing forwarding info → 400
//! - Upstream 4xx → same status
//! - Upstream 5xx → 502, upstream status in body and `x-upstream-status`
//! - Connectivity (refused, timeout, DNS) → 503
//! - Anything else → 500

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::forwarding::MissingForwardingInfo;
use crate::outbound::{DescriptorError, OutboundError, OutboundResponse, ResponseBody};

pub const X_UPSTREAM_STATUS: HeaderName = HeaderName::from_static("x-upstream-status");

/// Message returned when a forward-only endpoint has no usable port.
pub const MISSING_PORT_MESSAGE: &str = "Invalid or missing port information.";

/// Failure while serving a forwarding endpoint.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error(transparent)]
    MissingForwardingInfo(#[from] MissingForwardingInfo),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Outbound(#[from] OutboundError),
}

impl ForwardError {
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::MissingForwardingInfo(_) => StatusCode::BAD_REQUEST,
            ForwardError::Descriptor(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ForwardError::Outbound(err) => match err {
                OutboundError::ClientError { status, .. } => *status,
                OutboundError::ServerError { .. } => StatusCode::BAD_GATEWAY,
                OutboundError::ConnectivityError(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::MissingForwardingInfo(_) => "missing_forwarding_info",
            ForwardError::Descriptor(_) => "invalid_descriptor",
            ForwardError::Outbound(err) => err.kind(),
        }
    }

    fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            ForwardError::Outbound(err) => err.upstream_status(),
            _ => None,
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let upstream = self.upstream_status();
        let message = match &self {
            ForwardError::MissingForwardingInfo(_) => MISSING_PORT_MESSAGE.to_string(),
            other => other.to_string(),
        };

        let body = json!({
            "error": self.kind(),
            "message": message,
            "upstream_status": upstream.map(|s| s.as_u16()),
        });
        let mut response = (status, Json(body)).into_response();
        if let Some(upstream) = upstream {
            response
                .headers_mut()
                .insert(X_UPSTREAM_STATUS, HeaderValue::from(upstream.as_u16()));
        }
        response
    }
}

/// Turn a successful outbound result into the inbound response.
///
/// Every success is answered with 200, including an upstream that sent no body.
pub fn relay(response: OutboundResponse) -> Response {
    match response {
        OutboundResponse::NoContent { .. } => StatusCode::OK.into_response(),
        OutboundResponse::Content { body, .. } => match body {
            ResponseBody::Text(text) => (StatusCode::OK, text).into_response(),
            ResponseBody::Json(value) => (StatusCode::OK, Json(value)).into_response(),
            ResponseBody::Bytes(bytes) => (StatusCode::OK, bytes).into_response(),
        },
    }
}
