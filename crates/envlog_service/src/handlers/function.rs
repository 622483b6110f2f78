use crate::adapters::log_sink::LogSink;
use crate::runtime::contract::{InboundMessage, LogEntry, FALLBACK_PAYLOAD};
use crate::runtime::dispatch_error::DispatchError;
use crate::runtime::severity::Severity;

/// Log stream the function-trigger variant writes to.
pub const FUNCTION_LOG_NAME: &str = "test-log";

/// The background-function shape: log the decoded payload verbatim, without
/// dispatching by name. A message with no data logs the fixed fallback.
pub fn handle_function_event(
    inbound: &InboundMessage,
    sink: &dyn LogSink,
) -> Result<LogEntry, DispatchError> {
    let text = if inbound.data.is_empty() {
        FALLBACK_PAYLOAD.to_string()
    } else {
        inbound.operation_name()?
    };

    let entry = LogEntry {
        text,
        log_name: FUNCTION_LOG_NAME.to_string(),
        severity: Severity::Default,
    };

    sink.write(&entry)
        .map_err(|message| DispatchError::SinkUnavailable {
            operation: "function_event".to_string(),
            message,
        })?;

    Ok(entry)
}
