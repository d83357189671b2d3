//! Header name and port value validation.
//!
//! # Responsibilities
//! - Check a header name against the configured suffix and pattern
//! - Check a raw port value against the port pattern, numeric parse and range
//! - Optionally check the port against an explicit allow-list
//!
//! # Design Decisions
//! - Pure: no logging, no context access; callers log outcomes
//! - One validator type, parameterized by which checks are enabled
//! - Checks run in a fixed order so the reported reason is deterministic

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::forwarding::rules::PortHeaderRules;

/// Why a header was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidReason {
    BadHeaderPattern,
    BadPortFormat,
    PortOutOfRange,
    PortNotAllowlisted,
}

impl InvalidReason {
    /// Stable label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::BadHeaderPattern => "bad_header_pattern",
            InvalidReason::BadPortFormat => "bad_port_format",
            InvalidReason::PortOutOfRange => "port_out_of_range",
            InvalidReason::PortNotAllowlisted => "port_not_allowlisted",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of validating one header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid(u16),
    Invalid(InvalidReason),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }

    pub fn port(&self) -> Option<u16> {
        match self {
            ValidationOutcome::Valid(port) => Some(*port),
            ValidationOutcome::Invalid(_) => None,
        }
    }
}

/// Validate a header name and raw port value against `rules` (range check only).
///
/// `raw_port` is `None` when the header carried no textual value.
pub fn validate(header_name: &str, raw_port: Option<&str>, rules: &PortHeaderRules) -> ValidationOutcome {
    validate_with(header_name, raw_port, rules, None)
}

fn validate_with(
    header_name: &str,
    raw_port: Option<&str>,
    rules: &PortHeaderRules,
    allowed_ports: Option<&BTreeSet<u16>>,
) -> ValidationOutcome {
    if header_name.trim().is_empty()
        || !rules.has_suffix(header_name)
        || !rules.matches_header(header_name)
    {
        return ValidationOutcome::Invalid(InvalidReason::BadHeaderPattern);
    }

    let raw_port = match raw_port.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return ValidationOutcome::Invalid(InvalidReason::BadPortFormat),
    };
    if !rules.matches_port(raw_port) {
        return ValidationOutcome::Invalid(InvalidReason::BadPortFormat);
    }

    // The pattern may admit values that still do not parse (signs, overflow).
    let port: u32 = match raw_port.parse() {
        Ok(port) => port,
        Err(_) => return ValidationOutcome::Invalid(InvalidReason::BadPortFormat),
    };

    if !rules.in_range(port) {
        return ValidationOutcome::Invalid(InvalidReason::PortOutOfRange);
    }
    let port = match u16::try_from(port) {
        Ok(port) => port,
        Err(_) => return ValidationOutcome::Invalid(InvalidReason::PortOutOfRange),
    };

    if let Some(allowed) = allowed_ports {
        if !allowed.contains(&port) {
            return ValidationOutcome::Invalid(InvalidReason::PortNotAllowlisted);
        }
    }

    ValidationOutcome::Valid(port)
}

/// Validator bound to a rule set and, optionally, a port allow-list.
#[derive(Debug, Clone)]
pub struct HeaderValidator {
    rules: Arc<PortHeaderRules>,
    allowed_ports: Option<BTreeSet<u16>>,
}

impl HeaderValidator {
    /// Range-checking validator.
    pub fn new(rules: Arc<PortHeaderRules>) -> Self {
        Self {
            rules,
            allowed_ports: None,
        }
    }

    /// Additionally require the port to be in `ports`.
    pub fn with_allowlist(mut self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.allowed_ports = Some(ports.into_iter().collect());
        self
    }

    pub fn rules(&self) -> &PortHeaderRules {
        &self.rules
    }

    pub fn allowed_ports(&self) -> Option<&BTreeSet<u16>> {
        self.allowed_ports.as_ref()
    }

    /// Cheap pre-filter: only headers carrying the suffix are forwarding candidates.
    pub fn is_candidate(&self, header_name: &str) -> bool {
        self.rules.has_suffix(header_name)
    }

    pub fn validate(&self, header_name: &str, raw_port: Option<&str>) -> ValidationOutcome {
        validate_with(header_name, raw_port, &self.rules, self.allowed_ports.as_ref())
    }
}
