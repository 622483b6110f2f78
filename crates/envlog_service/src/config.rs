use crate::adapters::log_sink::Synchronicity;

pub const DEFAULT_TOPIC_ID: &str = "logging-test";
pub const DEFAULT_PORT: u16 = 8080;

/// Process configuration, read once at startup from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Start the pull subscriber.
    pub enable_subscriber: bool,
    /// Start the HTTP listener.
    pub run_server: bool,
    /// Topic name root; the subscription id is derived from it.
    pub topic_id: String,
    /// HTTP bind port.
    pub port: u16,
    /// Owning project; resolved from ambient metadata when absent.
    pub project_id: Option<String>,
    /// Whether replayed message ids are dispatched again.
    pub deduplicate: bool,
    /// Whether sink writes block until acknowledged.
    pub synchronicity: Synchronicity,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self {
            enable_subscriber: parse_bool_flag(std::env::var("ENABLE_SUBSCRIBER").ok()),
            run_server: parse_bool_flag(std::env::var("RUNSERVER").ok()),
            topic_id: non_empty_or(std::env::var("PUBSUB_TOPIC").ok(), DEFAULT_TOPIC_ID),
            port: parse_port(std::env::var("PORT").ok()),
            project_id: std::env::var("PROJECT_ID")
                .ok()
                .filter(|value| !value.trim().is_empty()),
            deduplicate: parse_bool_flag(std::env::var("DEDUPLICATE").ok()),
            synchronicity: Synchronicity::parse_or_default(
                std::env::var("LOG_WRITE_SYNCHRONICITY").ok().as_deref(),
            ),
        }
    }

    /// Subscription derived from the topic root.
    pub fn subscription_id(&self) -> String {
        format!("{}-subscriber", self.topic_id)
    }
}

fn parse_bool_flag(value: Option<String>) -> bool {
    match value.as_deref().map(str::trim) {
        Some(raw) => raw.eq_ignore_ascii_case("true") || raw == "1",
        None => false,
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => default.to_string(),
    }
}

fn parse_port(value: Option<String>) -> u16 {
    value
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(DEFAULT_PORT)
}
