//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → middleware/forwarded_port.rs (validate headers, fill request context)
//!     → server.rs handlers (decide: local answer or forward)
//!     → [outbound strategy executes the call]
//!     → response.rs (relay result, map failures to status codes)
//!     → Send to client
//! ```

pub mod middleware;
pub mod response;
pub mod server;

pub use response::ForwardError;
pub use server::{AppState, HttpServer, ServerError};
