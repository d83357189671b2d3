//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the forwarder.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the port forwarder.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration for inbound and outbound calls.
    pub timeouts: TimeoutConfig,

    /// Forwarded-port header rules.
    pub forwarding: ForwardingConfig,

    /// The downstream service reached when a request is forwarded.
    pub upstream: UpstreamConfig,

    /// Paths and bodies served by this instance.
    pub endpoints: EndpointConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
///
/// Outbound calls are never issued without both deadlines.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Outbound connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Outbound read timeout in seconds.
    pub read_secs: u64,

    /// Inbound request timeout (whole request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            read_secs: 10,
            request_secs: 30,
        }
    }
}

/// Forwarded-port header rules, shared by every endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ForwardingConfig {
    pub headers: PortHeaderConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PortHeaderConfig {
    /// Header name rules.
    pub patterns: HeaderPatternConfig,

    /// Header value rules.
    pub ports: PortConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeaderPatternConfig {
    /// Suffix every forwarding header name ends with (case-insensitive).
    pub suffix: String,

    /// Regex the whole header name must match.
    pub pattern: String,
}

impl Default for HeaderPatternConfig {
    fn default() -> Self {
        Self {
            suffix: "forwarded-port".to_string(),
            pattern: "^[a-zA-Z0-9-]+-forwarded-port$".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PortConfig {
    /// Regex a raw port value must match before numeric parsing.
    pub pattern: String,

    /// Inclusive range of accepted ports.
    pub range: PortRangeConfig,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            pattern: "^[0-9]+$".to_string(),
            range: PortRangeConfig::default(),
        }
    }
}

/// Port bounds are optional in the file so that a missing bound is reported
/// by validation instead of silently defaulting.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortRangeConfig {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl Default for PortRangeConfig {
    fn default() -> Self {
        Self {
            min: Some(8081),
            max: Some(8082),
        }
    }
}

/// Downstream service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Logical service name for logging/metrics.
    pub name: String,

    /// Host the outbound call is sent to.
    pub domain: String,

    /// Path template of the downstream endpoint.
    pub destination: String,

    /// Media type of the outbound request; selects the request strategy.
    pub media_type: String,

    /// Header carrying the port of this service.
    pub header: UpstreamHeaderConfig,

    /// Apply the explicit port allow-list on top of the range check.
    pub enforce_allowlist: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            name: "service-a".to_string(),
            domain: "localhost".to_string(),
            destination: "/target/path/b".to_string(),
            media_type: "application/json".to_string(),
            header: UpstreamHeaderConfig::default(),
            enforce_allowlist: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamHeaderConfig {
    /// Header key consumed to select the target port.
    pub key: String,

    /// Explicitly allow-listed ports.
    pub ports: Vec<u16>,
}

impl Default for UpstreamHeaderConfig {
    fn default() -> Self {
        Self {
            key: "service-a-forwarded-port".to_string(),
            ports: vec![8081, 8082],
        }
    }
}

/// Endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Endpoint that always forwards (400 when no port resolved).
    pub forward_path: String,

    /// Endpoint that answers locally unless a forwarded port is present.
    pub gateway_path: String,

    /// Body of the local response.
    pub local_body: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            forward_path: "/port/forward".to_string(),
            gateway_path: "/target/path/a".to_string(),
            local_body: "Destination A".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
