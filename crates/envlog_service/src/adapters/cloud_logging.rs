use serde_json::json;

use crate::adapters::log_sink::{LogSink, Synchronicity};
use crate::adapters::metadata::MetadataClient;
use crate::runtime::contract::LogEntry;

/// Managed logging backend REST surface.
pub const DEFAULT_LOGGING_ENDPOINT: &str = "https://logging.googleapis.com";

/// Sink writing single entries through the managed logging backend's
/// `entries:write` surface, authenticating via the ambient metadata service.
#[derive(Debug, Clone)]
pub struct CloudLoggingSink {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    metadata: MetadataClient,
    synchronicity: Synchronicity,
}

impl CloudLoggingSink {
    pub fn new(project_id: String, metadata: MetadataClient, synchronicity: Synchronicity) -> Self {
        Self::with_endpoint(DEFAULT_LOGGING_ENDPOINT, project_id, metadata, synchronicity)
    }

    pub fn with_endpoint(
        endpoint: &str,
        project_id: String,
        metadata: MetadataClient,
        synchronicity: Synchronicity,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id,
            metadata,
            synchronicity,
        }
    }

    async fn post_entry(&self, entry: &LogEntry) -> Result<(), String> {
        let token = self.metadata.access_token().await?;
        let body = write_request_body(&self.project_id, entry);

        self.http
            .post(format!("{}/v2/entries:write", self.endpoint))
            .bearer_auth(token.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|error| format!("failed to reach logging backend: {error}"))?
            .error_for_status()
            .map(|_| ())
            .map_err(|error| format!("logging backend rejected entry: {error}"))
    }
}

impl LogSink for CloudLoggingSink {
    fn write(&self, entry: &LogEntry) -> Result<(), String> {
        match self.synchronicity {
            Synchronicity::Sync => tokio::task::block_in_place(|| {
                tokio::runtime::Handle::current()
                    .block_on(async move { self.post_entry(entry).await })
            }),
            Synchronicity::Async => {
                let sink = self.clone();
                let entry = entry.clone();
                tokio::spawn(async move {
                    if let Err(error) = sink.post_entry(&entry).await {
                        log_sink_error(
                            "async_write_failed",
                            json!({
                                "log_name": entry.log_name,
                                "error": error,
                            }),
                        );
                    }
                });
                Ok(())
            }
        }
    }
}

fn write_request_body(project_id: &str, entry: &LogEntry) -> serde_json::Value {
    json!({
        "entries": [
            {
                "logName": format!("projects/{project_id}/logs/{}", entry.log_name),
                "resource": { "type": "global" },
                "severity": entry.severity.as_str(),
                "textPayload": entry.text,
            }
        ],
    })
}

fn log_sink_error(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "cloud_logging_sink",
            "level": "error",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::severity::Severity;

    #[test]
    fn request_body_targets_the_project_log() {
        let entry = LogEntry {
            text: "hi".to_string(),
            log_name: "mylog".to_string(),
            severity: Severity::Error,
        };

        let body = write_request_body("my-project", &entry);
        let entries = body["entries"].as_array().expect("entries should be a list");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["logName"], "projects/my-project/logs/mylog");
        assert_eq!(entries[0]["severity"], "ERROR");
        assert_eq!(entries[0]["textPayload"], "hi");
        assert_eq!(entries[0]["resource"]["type"], "global");
    }

    #[test]
    fn request_body_carries_default_severity() {
        let entry = LogEntry {
            text: "simplelog".to_string(),
            log_name: "test".to_string(),
            severity: Severity::Default,
        };

        let body = write_request_body("my-project", &entry);
        assert_eq!(body["entries"][0]["severity"], "DEFAULT");
    }
}
