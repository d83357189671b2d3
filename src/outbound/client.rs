//! Outbound HTTP client with deadline enforcement and failure classification.
//!
//! # Responsibilities
//! - Execute one HTTP call on the shared connection pool
//! - Decode the body according to the expected response type
//! - Classify failures (4xx, 5xx, connectivity, unknown) and log them with
//!   full request context
//!
//! # Design Decisions
//! - Single attempt: nothing here retries
//! - Connect and read timeouts are mandatory at construction
//! - An empty successful body is `NoContent`, not an error

use std::time::{Duration, Instant};

use axum::http::{HeaderMap, Method};
use url::Url;

use crate::config::TimeoutConfig;
use crate::outbound::descriptor::ResponseType;
use crate::outbound::types::{OutboundError, OutboundResponse, OutboundResult, ResponseBody};

/// A fully resolved outbound call.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
    pub response_type: ResponseType,
}

/// Pooled HTTP client shared by all requests.
#[derive(Debug, Clone)]
pub struct OutboundClient {
    client: reqwest::Client,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl OutboundClient {
    /// Create a client with the given deadlines.
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            connect_timeout,
            read_timeout,
        })
    }

    pub fn from_config(config: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            Duration::from_secs(config.connect_secs),
            Duration::from_secs(config.read_secs),
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub async fn send(&self, request: OutboundRequest) -> OutboundResult<OutboundResponse> {
        let started = Instant::now();
        let OutboundRequest {
            url,
            method,
            headers,
            body,
            response_type,
        } = request;

        tracing::info!(
            uri = %url,
            method = %method,
            headers = ?headers,
            body = body.as_deref().unwrap_or_default(),
            "[Request]"
        );

        let mut builder = self
            .client
            .request(method.clone(), url.clone())
            .headers(headers.clone());
        if let Some(body) = &body {
            builder = builder.body(body.clone());
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = classify_transport_error(&e);
                log_failure(&err, &url, &method, &headers, body.as_deref(), &e.to_string());
                return Err(err);
            }
        };

        let status = response.status();
        let payload = match response.bytes().await {
            Ok(payload) => payload,
            Err(e) => {
                let err = classify_transport_error(&e);
                log_failure(&err, &url, &method, &headers, body.as_deref(), &e.to_string());
                return Err(err);
            }
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if status.is_client_error() || status.is_server_error() {
            let text = String::from_utf8_lossy(&payload).into_owned();
            let err = if status.is_client_error() {
                OutboundError::ClientError {
                    status,
                    body: text.clone(),
                }
            } else {
                OutboundError::ServerError {
                    status,
                    body: text.clone(),
                }
            };
            log_failure(&err, &url, &method, &headers, body.as_deref(), &text);
            return Err(err);
        }

        if payload.is_empty() {
            tracing::info!(status = %status, elapsed_ms, "[Response] no content");
            return Ok(OutboundResponse::NoContent { status });
        }

        let decoded = match response_type {
            ResponseType::Text => ResponseBody::Text(String::from_utf8_lossy(&payload).into_owned()),
            ResponseType::Json => match serde_json::from_slice(&payload) {
                Ok(value) => ResponseBody::Json(value),
                Err(e) => {
                    let err = OutboundError::Decode(e.to_string());
                    log_failure(&err, &url, &method, &headers, body.as_deref(), &e.to_string());
                    return Err(err);
                }
            },
            ResponseType::Bytes => ResponseBody::Bytes(payload),
        };

        tracing::info!(status = %status, elapsed_ms, body = ?decoded, "[Response]");
        Ok(OutboundResponse::Content {
            status,
            body: decoded,
        })
    }
}

fn classify_transport_error(e: &reqwest::Error) -> OutboundError {
    if e.is_connect() || e.is_timeout() {
        OutboundError::ConnectivityError(e.to_string())
    } else {
        OutboundError::Unknown(e.to_string())
    }
}

fn log_failure(
    err: &OutboundError,
    url: &Url,
    method: &Method,
    headers: &HeaderMap,
    body: Option<&str>,
    response: &str,
) {
    let body = body.unwrap_or_default();
    match err {
        OutboundError::ClientError { .. } => tracing::warn!(
            kind = err.kind(),
            uri = %url,
            method = %method,
            headers = ?headers,
            body,
            response,
            "[Request] failed"
        ),
        _ => tracing::error!(
            kind = err.kind(),
            uri = %url,
            method = %method,
            headers = ?headers,
            body,
            response,
            "[Request] failed"
        ),
    }
}
