//! Header-driven request forwarder library.

pub mod config;
pub mod forwarding;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod outbound;

pub use config::schema::ForwarderConfig;
pub use forwarding::{ForwardingDecision, ForwardingDecisionEngine, HeaderValidator, PortHeaderRules, RequestScopeContext};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use outbound::{OutboundClient, RequestStrategy, RequestStrategyFactory};
