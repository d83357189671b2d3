//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the port header rules build (patterns compile, bounds sane)
//! - Check the upstream can actually be selected by a valid header
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ForwarderConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::BTreeMap;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ForwarderConfig;
use crate::forwarding::rules::{PortHeaderRules, RulesError};
use crate::outbound::descriptor::parse_media_type;
use crate::outbound::url_template::{UrlTemplateBuilder, UrlTemplateError};

/// A single semantic problem in the configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("forwarding.headers: {0}")]
    PortRules(#[from] RulesError),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} '{value}' must start with '/'")]
    RelativePath { field: &'static str, value: String },

    #[error("endpoints.forward_path and endpoints.gateway_path are both '{0}'")]
    DuplicatePath(String),

    #[error("upstream.header.key '{0}' does not match the forwarding header pattern")]
    HeaderKeyMismatch(String),

    #[error("upstream.header.ports contains {port}, outside the range {min}-{max}")]
    AllowlistedPortOutOfRange { port: u16, min: u16, max: u16 },

    #[error("upstream.enforce_allowlist is set but upstream.header.ports is empty")]
    EmptyAllowlist,

    #[error("upstream.media_type '{0}' is not a valid media type")]
    InvalidMediaType(String),

    #[error("upstream target: {0}")]
    UpstreamUrl(UrlTemplateError),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ForwarderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let timeouts = &config.timeouts;
    for (name, value) in [
        ("timeouts.connect_secs", timeouts.connect_secs),
        ("timeouts.read_secs", timeouts.read_secs),
        ("timeouts.request_secs", timeouts.request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    let upstream = &config.upstream;
    if upstream.domain.trim().is_empty() {
        errors.push(ValidationError::Empty("upstream.domain"));
    } else if let Err(e) =
        UrlTemplateBuilder::new().build(&upstream.domain, &upstream.destination, None, &BTreeMap::new())
    {
        errors.push(ValidationError::UpstreamUrl(e));
    }
    if upstream.header.key.trim().is_empty() {
        errors.push(ValidationError::Empty("upstream.header.key"));
    }
    if parse_media_type(&upstream.media_type).is_err() {
        errors.push(ValidationError::InvalidMediaType(upstream.media_type.clone()));
    }
    if upstream.enforce_allowlist && upstream.header.ports.is_empty() {
        errors.push(ValidationError::EmptyAllowlist);
    }

    let endpoints = &config.endpoints;
    for (field, value) in [
        ("upstream.destination", &upstream.destination),
        ("endpoints.forward_path", &endpoints.forward_path),
        ("endpoints.gateway_path", &endpoints.gateway_path),
    ] {
        if !value.starts_with('/') {
            errors.push(ValidationError::RelativePath {
                field,
                value: value.clone(),
            });
        }
    }
    if endpoints.forward_path == endpoints.gateway_path {
        errors.push(ValidationError::DuplicatePath(endpoints.forward_path.clone()));
    }

    match PortHeaderRules::from_config(&config.forwarding.headers) {
        Ok(rules) => {
            let key = upstream.header.key.trim();
            if !key.is_empty() && !(rules.has_suffix(key) && rules.matches_header(key)) {
                errors.push(ValidationError::HeaderKeyMismatch(key.to_string()));
            }
            for &port in &upstream.header.ports {
                if !rules.in_range(u32::from(port)) {
                    errors.push(ValidationError::AllowlistedPortOutOfRange {
                        port,
                        min: rules.min_port(),
                        max: rules.max_port(),
                    });
                }
            }
        }
        Err(e) => errors.push(ValidationError::PortRules(e)),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
