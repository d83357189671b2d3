//! Outbound call subsystem.
//!
//! # Data Flow
//! ```text
//! OutboundRequestDescriptor (media type, domain, path, port, headers, ...)
//!     → factory.rs (first registered strategy that supports the media type)
//!     → strategy.rs (pre-process → do_execute → post-process)
//!         → url_template.rs (http://domain[:port]/expanded/path)
//!         → client.rs (pooled HTTP call with connect/read deadlines)
//!     → OutboundResponse | classified OutboundError (types.rs)
//! ```
//!
//! # Design Decisions
//! - Single attempt per call; no retries, no circuit breaking
//! - Every call has deadlines; a slow upstream cannot pin a worker
//! - Unknown failures are surfaced, never absorbed

pub mod client;
pub mod descriptor;
pub mod factory;
pub mod strategy;
pub mod types;
pub mod url_template;

pub use client::{OutboundClient, OutboundRequest};
pub use descriptor::{parse_media_type, DescriptorError, OutboundRequestDescriptor, ResponseType};
pub use factory::RequestStrategyFactory;
pub use strategy::{JsonRequestStrategy, RequestStrategy, TextRequestStrategy};
pub use types::{OutboundError, OutboundResponse, OutboundResult, ResponseBody};
pub use url_template::{UrlTemplateBuilder, UrlTemplateError};
