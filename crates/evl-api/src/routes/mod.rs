//! # API Route Modules
//!
//! - `evidence` — upload, query, history, enumeration and verification of
//!   evidence versions. Paths follow the original web backend so existing
//!   frontends keep working.

pub mod evidence;
