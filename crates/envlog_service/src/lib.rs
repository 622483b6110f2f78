//! Runtime adapters and handlers for the pub/sub logging trigger harness.
//!
//! This crate owns runtime integration details (subscriber service, HTTP
//! surface, snippet dispatch, and logging sink adapters) and exposes a
//! single runtime module boundary for the message contract primitives.

pub mod adapters;
pub mod config;
pub mod dedup;
pub mod handlers;
pub mod http;
pub mod runtime;
pub mod subscriber;
