pub mod cloud_logging;
pub mod log_sink;
pub mod metadata;
