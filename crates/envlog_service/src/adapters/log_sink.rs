use crate::runtime::contract::LogEntry;

/// Boundary to the managed logging backend. Implementations return the
/// failure to the caller; they never print and never retry.
pub trait LogSink {
    fn write(&self, entry: &LogEntry) -> Result<(), String>;
}

/// Whether a sink write blocks until the backend acknowledges it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synchronicity {
    /// Block until the backend accepts the entry.
    Sync,
    /// Hand the entry to a background task and return immediately. Write
    /// failures are then only visible in the diagnostic log.
    Async,
}

impl Synchronicity {
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value {
            Some(raw) if raw.trim().eq_ignore_ascii_case("async") => Self::Async,
            _ => Self::Sync,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synchronicity_defaults_to_sync() {
        assert_eq!(Synchronicity::parse_or_default(None), Synchronicity::Sync);
        assert_eq!(
            Synchronicity::parse_or_default(Some("blocking")),
            Synchronicity::Sync
        );
    }

    #[test]
    fn synchronicity_accepts_async_flag() {
        assert_eq!(
            Synchronicity::parse_or_default(Some("async")),
            Synchronicity::Async
        );
        assert_eq!(
            Synchronicity::parse_or_default(Some(" ASYNC ")),
            Synchronicity::Async
        );
    }
}
