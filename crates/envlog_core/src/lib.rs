//! Deterministic domain primitives for the logging trigger harness.
//!
//! This crate owns the inbound message contract, payload decoding, severity
//! mapping, and log entry construction. It intentionally excludes pub/sub
//! client, HTTP, and cloud logging runtime concerns.

pub mod contract;
pub mod dispatch_error;
pub mod severity;
