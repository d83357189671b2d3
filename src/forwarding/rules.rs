//! Forwarded-port header rules.
//!
//! # Responsibilities
//! - Hold the header-name suffix and pattern, the port-value pattern and the
//!   accepted port range
//! - Compile the patterns once, at construction
//!
//! # Design Decisions
//! - Fail fast: bad patterns or bounds never produce a value
//! - Immutable after construction (shared via Arc without locks)
//! - Patterns are anchored so they must match the whole input

use regex::Regex;
use thiserror::Error;

use crate::config::schema::PortHeaderConfig;

/// Lowest port accepted as a configured bound.
pub const MIN_CONFIGURABLE_PORT: u32 = 1024;
/// Highest port accepted as a configured bound.
pub const MAX_CONFIGURABLE_PORT: u32 = 65535;

/// Errors raised while building [`PortHeaderRules`].
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("header suffix must not be empty")]
    EmptySuffix,

    #[error("invalid header pattern '{pattern}': {source}")]
    InvalidHeaderPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid port pattern '{pattern}': {source}")]
    InvalidPortPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("port range {0} must be set")]
    MissingBound(&'static str),

    #[error("{which} port {value} must be between 1024 and 65535")]
    BoundOutOfRange { which: &'static str, value: u32 },

    #[error("min port {min} cannot be greater than max port {max}")]
    InvertedRange { min: u16, max: u16 },
}

/// Validated, immutable forwarded-port header rules.
#[derive(Debug, Clone)]
pub struct PortHeaderRules {
    header_suffix: String,
    header_pattern: String,
    port_pattern: String,
    header_regex: Regex,
    port_regex: Regex,
    min_port: u16,
    max_port: u16,
}

impl PortHeaderRules {
    /// Build rules from raw values.
    pub fn new(
        header_suffix: impl Into<String>,
        header_pattern: impl Into<String>,
        port_pattern: impl Into<String>,
        min_port: Option<u32>,
        max_port: Option<u32>,
    ) -> Result<Self, RulesError> {
        let header_suffix = header_suffix.into();
        let header_pattern = header_pattern.into();
        let port_pattern = port_pattern.into();

        if header_suffix.trim().is_empty() {
            return Err(RulesError::EmptySuffix);
        }

        let header_regex = anchored(&header_pattern).map_err(|source| {
            RulesError::InvalidHeaderPattern {
                pattern: header_pattern.clone(),
                source,
            }
        })?;
        let port_regex = anchored(&port_pattern).map_err(|source| RulesError::InvalidPortPattern {
            pattern: port_pattern.clone(),
            source,
        })?;

        let min_port = check_bound("min", min_port)?;
        let max_port = check_bound("max", max_port)?;
        if min_port > max_port {
            return Err(RulesError::InvertedRange {
                min: min_port,
                max: max_port,
            });
        }

        tracing::debug!(
            suffix = %header_suffix,
            header_pattern = %header_pattern,
            port_pattern = %port_pattern,
            min_port,
            max_port,
            "Port header rules initialized"
        );

        Ok(Self {
            header_suffix,
            header_pattern,
            port_pattern,
            header_regex,
            port_regex,
            min_port,
            max_port,
        })
    }

    /// Build rules from the `forwarding.headers` config section.
    pub fn from_config(config: &PortHeaderConfig) -> Result<Self, RulesError> {
        Self::new(
            config.patterns.suffix.clone(),
            config.patterns.pattern.clone(),
            config.ports.pattern.clone(),
            config.ports.range.min,
            config.ports.range.max,
        )
    }

    pub fn header_suffix(&self) -> &str {
        &self.header_suffix
    }

    pub fn header_pattern(&self) -> &str {
        &self.header_pattern
    }

    pub fn port_pattern(&self) -> &str {
        &self.port_pattern
    }

    pub fn min_port(&self) -> u16 {
        self.min_port
    }

    pub fn max_port(&self) -> u16 {
        self.max_port
    }

    /// True if the name ends with the configured suffix, ignoring ASCII case.
    pub fn has_suffix(&self, header_name: &str) -> bool {
        header_name
            .to_ascii_lowercase()
            .ends_with(&self.header_suffix.to_ascii_lowercase())
    }

    /// True if the whole name matches the header pattern.
    pub fn matches_header(&self, header_name: &str) -> bool {
        self.header_regex.is_match(header_name)
    }

    /// True if the whole value matches the port pattern.
    pub fn matches_port(&self, raw_port: &str) -> bool {
        self.port_regex.is_match(raw_port)
    }

    /// True if the port lies within `[min_port, max_port]`.
    pub fn in_range(&self, port: u32) -> bool {
        port >= u32::from(self.min_port) && port <= u32::from(self.max_port)
    }
}

fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern))
}

fn check_bound(which: &'static str, value: Option<u32>) -> Result<u16, RulesError> {
    let value = value.ok_or(RulesError::MissingBound(which))?;
    if !(MIN_CONFIGURABLE_PORT..=MAX_CONFIGURABLE_PORT).contains(&value) {
        return Err(RulesError::BoundOutOfRange { which, value });
    }
    u16::try_from(value).map_err(|_| RulesError::BoundOutOfRange { which, value })
}
