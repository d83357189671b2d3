//! Inbound middleware.

pub mod forwarded_port;

pub use forwarded_port::{forwarded_port_filter, populate};
