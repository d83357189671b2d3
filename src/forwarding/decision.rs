//! Forwarding decision.
//!
//! Reads the configured header key from the request context and decides
//! whether the request is answered locally or forwarded. The engine never
//! performs the call itself.

use thiserror::Error;

use crate::forwarding::context::RequestScopeContext;

/// Outcome of [`ForwardingDecisionEngine::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardingDecision {
    /// Serve the local response.
    LocalHandle,
    /// Forward to the configured upstream on this port.
    Forward(u16),
}

/// Forwarding was required but no valid port was resolved.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("port information is missing for header '{key}'")]
pub struct MissingForwardingInfo {
    pub key: String,
}

/// Decide using an explicit header key.
pub fn decide(context: &RequestScopeContext, header_key: &str) -> ForwardingDecision {
    match context.get_attribute(header_key) {
        Some(port) => ForwardingDecision::Forward(port),
        None => ForwardingDecision::LocalHandle,
    }
}

/// Decision engine bound to the header key of the configured upstream.
#[derive(Debug, Clone)]
pub struct ForwardingDecisionEngine {
    header_key: String,
}

impl ForwardingDecisionEngine {
    pub fn new(header_key: impl Into<String>) -> Self {
        Self {
            header_key: header_key.into(),
        }
    }

    pub fn header_key(&self) -> &str {
        &self.header_key
    }

    pub fn decide(&self, context: &RequestScopeContext) -> ForwardingDecision {
        let decision = decide(context, &self.header_key);
        tracing::debug!(key = %self.header_key, ?decision, "Forwarding decision");
        decision
    }

    /// Decide for an endpoint that must forward.
    pub fn decide_required(&self, context: &RequestScopeContext) -> Result<u16, MissingForwardingInfo> {
        match self.decide(context) {
            ForwardingDecision::Forward(port) => Ok(port),
            ForwardingDecision::LocalHandle => {
                tracing::error!(
                    key = %self.header_key,
                    context_entries = context.len(),
                    "Port information is missing in the context"
                );
                Err(MissingForwardingInfo {
                    key: self.header_key.clone(),
                })
            }
        }
    }
}
