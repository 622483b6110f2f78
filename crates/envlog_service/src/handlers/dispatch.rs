use std::collections::BTreeMap;

use serde_json::json;

use crate::adapters::log_sink::LogSink;
use crate::runtime::contract::{Attributes, InboundMessage, LogEntry};
use crate::runtime::dispatch_error::DispatchError;

/// A registered snippet: takes the message attributes and the sink, performs
/// its one observable effect, and reports failure as a plain message.
pub type SnippetFn = fn(&Attributes, &dyn LogSink) -> Result<(), String>;

/// Explicit mapping from operation name to snippet function. The set of
/// valid operations is closed, statically registered, and enumerable.
#[derive(Debug, Clone)]
pub struct SnippetRegistry {
    snippets: BTreeMap<&'static str, SnippetFn>,
}

impl SnippetRegistry {
    pub fn new() -> Self {
        Self {
            snippets: BTreeMap::new(),
        }
    }

    /// Registry with every snippet this harness ships.
    pub fn with_builtin_snippets() -> Self {
        let mut registry = Self::new();
        registry.register("simplelog", simplelog);
        registry.register("stdlog", stdlog);
        registry
    }

    pub fn register(&mut self, name: &'static str, snippet: SnippetFn) {
        self.snippets.insert(name, snippet);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.snippets.keys().copied().collect()
    }

    fn lookup(&self, name: &str) -> Option<SnippetFn> {
        self.snippets.get(name).copied()
    }
}

impl Default for SnippetRegistry {
    fn default() -> Self {
        Self::with_builtin_snippets()
    }
}

/// Successful dispatch: which operation ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedSnippet {
    pub operation: String,
}

/// Decode the message payload into an operation name, look it up with an
/// exact string match, and invoke the matching snippet exactly once with the
/// attributes. Returns a typed outcome; the caller decides logging and
/// acknowledgment policy.
pub fn dispatch(
    registry: &SnippetRegistry,
    inbound: &InboundMessage,
    sink: &dyn LogSink,
) -> Result<DispatchedSnippet, DispatchError> {
    let operation = inbound.operation_name()?;

    let Some(snippet) = registry.lookup(&operation) else {
        return Err(DispatchError::UnknownOperation { name: operation });
    };

    match snippet(&inbound.attributes, sink) {
        Ok(()) => Ok(DispatchedSnippet { operation }),
        Err(message) => Err(DispatchError::SinkUnavailable { operation, message }),
    }
}

/// Build one entry from the attributes (with defaults) and write it to the
/// managed sink.
fn simplelog(attributes: &Attributes, sink: &dyn LogSink) -> Result<(), String> {
    let entry = LogEntry::from_attributes(attributes);
    sink.write(&entry)
}

/// Write through the process's own stdout at the mapped severity instead of
/// the managed sink, exercising plain process logging.
fn stdlog(attributes: &Attributes, _sink: &dyn LogSink) -> Result<(), String> {
    let entry = LogEntry::from_attributes(attributes);
    println!(
        "{}",
        json!({
            "severity": entry.severity.as_str(),
            "log_name": entry.log_name,
            "message": entry.text,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })
    );
    Ok(())
}
