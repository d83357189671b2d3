//! Outbound call results and error classification.

use axum::body::Bytes;
use axum::http::StatusCode;
use mime::Mime;
use thiserror::Error;

use crate::outbound::descriptor::DescriptorError;
use crate::outbound::url_template::UrlTemplateError;

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Text(String),
    Json(serde_json::Value),
    Bytes(Bytes),
}

impl ResponseBody {
    /// Render the body as bytes for relaying to the inbound caller.
    pub fn into_bytes(self) -> Bytes {
        match self {
            ResponseBody::Text(text) => Bytes::from(text),
            ResponseBody::Json(value) => Bytes::from(value.to_string()),
            ResponseBody::Bytes(bytes) => bytes,
        }
    }
}

/// Successful outbound call.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundResponse {
    Content { status: StatusCode, body: ResponseBody },
    /// The upstream answered successfully with an empty body.
    NoContent { status: StatusCode },
}

/// Errors that can occur during an outbound call.
#[derive(Debug, Error)]
pub enum OutboundError {
    /// Upstream answered 4xx.
    #[error("upstream rejected request with {status}")]
    ClientError { status: StatusCode, body: String },

    /// Upstream answered 5xx.
    #[error("upstream failed with {status}")]
    ServerError { status: StatusCode, body: String },

    /// Connect/read timeout, DNS failure, refused connection.
    #[error("upstream unreachable: {0}")]
    ConnectivityError(String),

    /// No registered strategy handles the media type.
    #[error("unsupported request strategy for media type '{0}'")]
    UnsupportedStrategy(Mime),

    #[error(transparent)]
    InvalidUrl(#[from] UrlTemplateError),

    #[error(transparent)]
    InvalidDescriptor(#[from] DescriptorError),

    #[error("failed to decode upstream response: {0}")]
    Decode(String),

    /// Anything else; never swallowed.
    #[error("unexpected outbound failure: {0}")]
    Unknown(String),
}

impl OutboundError {
    /// Stable label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundError::ClientError { .. } => "client_error",
            OutboundError::ServerError { .. } => "server_error",
            OutboundError::ConnectivityError(_) => "connectivity_error",
            OutboundError::UnsupportedStrategy(_) => "unsupported_strategy",
            OutboundError::InvalidUrl(_) => "invalid_url",
            OutboundError::InvalidDescriptor(_) => "invalid_descriptor",
            OutboundError::Decode(_) => "decode_error",
            OutboundError::Unknown(_) => "unknown_error",
        }
    }

    /// Status returned by the upstream, when it answered at all.
    pub fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            OutboundError::ClientError { status, .. } | OutboundError::ServerError { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Result type for outbound operations.
pub type OutboundResult<T> = Result<T, OutboundError>;
