//! Module boundary for the contract primitives owned by `envlog_core`.

pub use envlog_core::{contract, dispatch_error, severity};
