//! Forwarded-port subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound headers
//!     → validator.rs (name pattern, port format, range, allow-list)
//!     → context.rs (valid entries, one context per request)
//!     → decision.rs (LocalHandle | Forward(port))
//!     → headers.rs (re-emit remaining entries on the outbound call)
//!
//! Startup:
//!     forwarding.headers config
//!     → rules.rs (compile patterns, check bounds, fail fast)
//!     → shared via Arc, read-only
//! ```
//!
//! # Design Decisions
//! - Validation failures are handled where detected; the header is dropped
//! - The context is owned by its request and cleared when the request ends
//! - Ordering per request: validate → populate → decide → forward

pub mod context;
pub mod decision;
pub mod headers;
pub mod rules;
pub mod validator;

pub use context::{ContextScope, RequestScopeContext};
pub use decision::{decide, ForwardingDecision, ForwardingDecisionEngine, MissingForwardingInfo};
pub use headers::outbound_headers;
pub use rules::{PortHeaderRules, RulesError};
pub use validator::{validate, HeaderValidator, InvalidReason, ValidationOutcome};
