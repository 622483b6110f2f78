use serde::{Deserialize, Serialize};

/// Log severity as understood by the managed logging backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Default,
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Severity {
    /// The uppercase wire name the backend expects.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Notice => "NOTICE",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
            Self::Alert => "ALERT",
            Self::Emergency => "EMERGENCY",
        }
    }

    /// Parse an exact uppercase wire name. Anything else maps to `Default`,
    /// so a message that omits or misspells the severity attribute still
    /// produces an entry.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value {
            Some("DEBUG") => Self::Debug,
            Some("INFO") => Self::Info,
            Some("NOTICE") => Self::Notice,
            Some("WARNING") => Self::Warning,
            Some("ERROR") => Self::Error,
            Some("CRITICAL") => Self::Critical,
            Some("ALERT") => Self::Alert,
            Some("EMERGENCY") => Self::Emergency,
            _ => Self::Default,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
