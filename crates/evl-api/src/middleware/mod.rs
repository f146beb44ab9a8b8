//! # Middleware
//!
//! - [`metrics`] — request and error counters behind `/metrics`.

pub mod metrics;
