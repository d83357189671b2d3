//! Outbound request strategies.
//!
//! # Responsibilities
//! - Declare which media types a strategy handles
//! - Run every call through the same pre-process → execute → post-process
//!   template
//! - Prepare headers (content type), URL and body for the client
//!
//! # Design Decisions
//! - Hooks are observability only; they never touch routing fields
//! - New payload formats are new strategies; the decision engine and the
//!   inbound filter stay untouched

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum::http::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use mime::Mime;

use crate::observability::metrics;
use crate::outbound::client::{OutboundClient, OutboundRequest};
use crate::outbound::descriptor::OutboundRequestDescriptor;
use crate::outbound::types::{OutboundResponse, OutboundResult};
use crate::outbound::url_template::UrlTemplateBuilder;

/// A pluggable executor for one family of outbound payload types.
#[async_trait]
pub trait RequestStrategy: Send + Sync {
    /// Name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Media types this strategy executes.
    fn supported_media_types(&self) -> &[Mime];

    /// Matches on the type and subtype only; parameters such as `charset` are ignored.
    fn supports(&self, descriptor: &OutboundRequestDescriptor) -> bool {
        let essence = descriptor.media_type().essence_str();
        self.supported_media_types()
            .iter()
            .any(|m| m.essence_str() == essence)
    }

    /// Template method: hooks around [`RequestStrategy::do_execute`].
    async fn execute(&self, descriptor: &OutboundRequestDescriptor) -> OutboundResult<OutboundResponse> {
        tracing::info!(strategy = self.name(), "Executing strategy");
        let started = Instant::now();
        self.pre_process(descriptor);
        let result = self.do_execute(descriptor).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::record_outbound(self.name(), outcome, started);
        let result = result?;
        self.post_process(&result);
        Ok(result)
    }

    fn pre_process(&self, descriptor: &OutboundRequestDescriptor) {
        tracing::debug!(
            strategy = self.name(),
            domain = descriptor.domain(),
            path = descriptor.path(),
            "Preprocessing request"
        );
    }

    async fn do_execute(&self, descriptor: &OutboundRequestDescriptor) -> OutboundResult<OutboundResponse>;

    fn post_process(&self, result: &OutboundResponse) {
        tracing::debug!(strategy = self.name(), ?result, "Postprocessing result");
    }
}

/// Resolve a descriptor into a client request carrying `content_type`.
pub fn prepare_request(
    descriptor: &OutboundRequestDescriptor,
    content_type: &Mime,
    urls: &UrlTemplateBuilder,
) -> OutboundResult<OutboundRequest> {
    let url = urls.build(
        descriptor.domain(),
        descriptor.path(),
        descriptor.port(),
        descriptor.path_variables(),
    )?;

    let mut headers = descriptor.headers().clone();
    if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
        headers.insert(CONTENT_TYPE, value.clone());
        headers.insert(ACCEPT, value);
    }

    Ok(OutboundRequest {
        url,
        method: descriptor.method().clone(),
        headers,
        body: descriptor.body().map(str::to_string),
        response_type: descriptor.response_type(),
    })
}

/// `application/json` payloads.
#[derive(Debug, Clone)]
pub struct JsonRequestStrategy {
    client: Arc<OutboundClient>,
    urls: UrlTemplateBuilder,
    media_types: [Mime; 1],
}

impl JsonRequestStrategy {
    pub fn new(client: Arc<OutboundClient>) -> Self {
        Self {
            client,
            urls: UrlTemplateBuilder::new(),
            media_types: [mime::APPLICATION_JSON],
        }
    }
}

#[async_trait]
impl RequestStrategy for JsonRequestStrategy {
    fn name(&self) -> &'static str {
        "json"
    }

    fn supported_media_types(&self) -> &[Mime] {
        &self.media_types
    }

    async fn do_execute(&self, descriptor: &OutboundRequestDescriptor) -> OutboundResult<OutboundResponse> {
        let request = prepare_request(descriptor, &mime::APPLICATION_JSON, &self.urls)?;
        self.client.send(request).await
    }
}

/// `text/plain` payloads.
#[derive(Debug, Clone)]
pub struct TextRequestStrategy {
    client: Arc<OutboundClient>,
    urls: UrlTemplateBuilder,
    media_types: [Mime; 1],
}

impl TextRequestStrategy {
    pub fn new(client: Arc<OutboundClient>) -> Self {
        Self {
            client,
            urls: UrlTemplateBuilder::new(),
            media_types: [mime::TEXT_PLAIN],
        }
    }
}

#[async_trait]
impl RequestStrategy for TextRequestStrategy {
    fn name(&self) -> &'static str {
        "text"
    }

    fn supported_media_types(&self) -> &[Mime] {
        &self.media_types
    }

    async fn do_execute(&self, descriptor: &OutboundRequestDescriptor) -> OutboundResult<OutboundResponse> {
        let request = prepare_request(descriptor, &mime::TEXT_PLAIN, &self.urls)?;
        self.client.send(request).await
    }
}
