use std::sync::Arc;
use std::time::Duration;

use google_cloud_googleapis::pubsub::v1::PubsubMessage;
use google_cloud_pubsub::client::Client;
use google_cloud_pubsub::subscription::SubscriptionConfig;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::adapters::log_sink::LogSink;
use crate::dedup::MessageDeduplicator;
use crate::handlers::dispatch::{dispatch, SnippetRegistry};
use crate::runtime::contract::{Attributes, InboundMessage};
use crate::runtime::dispatch_error::DispatchError;

/// Ack deadline requested when the subscription is created.
pub const SUBSCRIPTION_ACK_DEADLINE_SECONDS: i32 = 20;

/// How long a bare listener waits for traffic before stopping itself.
pub const DEFAULT_LISTEN_WINDOW: Duration = Duration::from_secs(30);

/// What became of one received message. The message is acked regardless;
/// the disposition records why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageDisposition {
    Dispatched { operation: String },
    DuplicateDelivery,
    DecodeFailure { detail: String },
    DispatchMiss { operation: String },
    SinkFailure { operation: String, detail: String },
}

/// Apply the per-message pipeline: dedup policy, then dispatch. Reentrant
/// and stateless apart from the dedup window; the transport owns delivery
/// concurrency.
pub fn process_inbound(
    inbound: &InboundMessage,
    registry: &SnippetRegistry,
    sink: &dyn LogSink,
    dedup: Option<&MessageDeduplicator>,
) -> MessageDisposition {
    if let Some(dedup) = dedup {
        if dedup.check_and_record(&inbound.message_id) {
            return MessageDisposition::DuplicateDelivery;
        }
    }

    match dispatch(registry, inbound, sink) {
        Ok(dispatched) => MessageDisposition::Dispatched {
            operation: dispatched.operation,
        },
        Err(DispatchError::Decode(error)) => MessageDisposition::DecodeFailure {
            detail: error.to_string(),
        },
        Err(DispatchError::UnknownOperation { name }) => {
            MessageDisposition::DispatchMiss { operation: name }
        }
        Err(DispatchError::SinkUnavailable { operation, message }) => {
            MessageDisposition::SinkFailure {
                operation,
                detail: message,
            }
        }
    }
}

/// Long-lived pull listener, constructed once at startup and stopped
/// through the cancellation handle it owns.
pub struct SubscriberService {
    client: Client,
    topic_id: String,
    subscription_id: String,
    registry: Arc<SnippetRegistry>,
    sink: Arc<dyn LogSink + Send + Sync>,
    dedup: Option<Arc<MessageDeduplicator>>,
    cancel: CancellationToken,
}

impl SubscriberService {
    pub fn new(
        client: Client,
        topic_id: String,
        subscription_id: String,
        registry: Arc<SnippetRegistry>,
        sink: Arc<dyn LogSink + Send + Sync>,
        dedup: Option<Arc<MessageDeduplicator>>,
    ) -> Self {
        Self {
            client,
            topic_id,
            subscription_id,
            registry,
            sink,
            dedup,
            cancel: CancellationToken::new(),
        }
    }

    /// Handle that stops the listener from wherever it is held.
    pub fn stop_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Create `<topic>-subscriber` on the configured topic when it does not
    /// already exist.
    pub async fn ensure_subscription(&self) -> Result<(), String> {
        let ctx = self.cancel.clone();
        let topic = self.client.topic(&self.topic_id);
        let subscription = self.client.subscription(&self.subscription_id);

        let exists = subscription
            .exists(Some(ctx.clone()), None)
            .await
            .map_err(|error| format!("failed to check subscription: {error}"))?;
        if exists {
            return Ok(());
        }

        let mut config = SubscriptionConfig::default();
        config.ack_deadline_seconds = SUBSCRIPTION_ACK_DEADLINE_SECONDS;

        subscription
            .create(topic.fully_qualified_name(), config, Some(ctx), None)
            .await
            .map(|_| ())
            .map_err(|error| format!("failed to create subscription: {error}"))?;

        log_subscriber_info(
            "subscription_created",
            json!({
                "topic": self.topic_id,
                "subscription": self.subscription_id,
            }),
        );
        Ok(())
    }

    /// Receive until the cancellation handle fires. Every message is acked
    /// after processing, whatever its disposition.
    pub async fn run(&self) -> Result<(), String> {
        let registry = self.registry.clone();
        let sink = self.sink.clone();
        let dedup = self.dedup.clone();
        let subscription = self.client.subscription(&self.subscription_id);

        log_subscriber_info(
            "listening",
            json!({ "subscription": self.subscription_id }),
        );

        subscription
            .receive(
                move |mut message, _ctx| {
                    let registry = registry.clone();
                    let sink = sink.clone();
                    let dedup = dedup.clone();
                    async move {
                        let inbound = inbound_from_received(&message.message);
                        let disposition =
                            process_inbound(&inbound, &registry, sink.as_ref(), dedup.as_deref());
                        log_disposition(&inbound, &disposition);
                        message.ack().await;
                    }
                },
                self.cancel.clone(),
                None,
            )
            .await
            .map_err(|error| format!("subscriber receive failed: {error}"))
    }

    /// Listen for a bounded window, then stop the listener. This is the
    /// recovery path for a listener that never sees traffic.
    pub async fn run_for(&self, window: Duration) -> Result<(), String> {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            cancel.cancel();
        });
        self.run().await
    }
}

fn inbound_from_received(message: &PubsubMessage) -> InboundMessage {
    let attributes: Attributes = message
        .attributes
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let publish_time = message.publish_time.as_ref().and_then(|ts| {
        chrono::DateTime::from_timestamp(ts.seconds, ts.nanos.max(0) as u32)
            .map(|stamp| stamp.to_rfc3339())
    });

    InboundMessage {
        data: message.data.clone(),
        attributes,
        message_id: message.message_id.clone(),
        publish_time,
    }
}

fn log_disposition(inbound: &InboundMessage, disposition: &MessageDisposition) {
    match disposition {
        MessageDisposition::Dispatched { operation } => log_subscriber_info(
            "snippet_dispatched",
            json!({
                "operation": operation,
                "message_id": inbound.message_id,
            }),
        ),
        MessageDisposition::DuplicateDelivery => log_subscriber_info(
            "duplicate_delivery",
            json!({ "message_id": inbound.message_id }),
        ),
        MessageDisposition::DecodeFailure { detail } => log_subscriber_error(
            "decode_failed",
            json!({
                "message_id": inbound.message_id,
                "error": detail,
            }),
        ),
        MessageDisposition::DispatchMiss { operation } => log_subscriber_info(
            "dispatch_miss",
            json!({
                "operation": operation,
                "message_id": inbound.message_id,
            }),
        ),
        MessageDisposition::SinkFailure { operation, detail } => log_subscriber_error(
            "sink_write_failed",
            json!({
                "operation": operation,
                "message_id": inbound.message_id,
                "error": detail,
            }),
        ),
    }
}

fn log_subscriber_info(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "subscriber",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

fn log_subscriber_error(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "subscriber",
            "level": "error",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::runtime::contract::LogEntry;

    struct RecordingSink {
        writes: Mutex<Vec<LogEntry>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                writes: Mutex::new(Vec::new()),
            }
        }

        fn entries(&self) -> Vec<LogEntry> {
            self.writes.lock().expect("poisoned mutex").clone()
        }
    }

    impl LogSink for RecordingSink {
        fn write(&self, entry: &LogEntry) -> Result<(), String> {
            self.writes
                .lock()
                .expect("poisoned mutex")
                .push(entry.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl LogSink for FailingSink {
        fn write(&self, _entry: &LogEntry) -> Result<(), String> {
            Err("simulated backend outage".to_string())
        }
    }

    fn inbound(payload: &[u8], message_id: &str) -> InboundMessage {
        InboundMessage {
            data: payload.to_vec(),
            attributes: Attributes::from([("log_text".to_string(), "hi".to_string())]),
            message_id: message_id.to_string(),
            publish_time: None,
        }
    }

    #[test]
    fn known_operation_is_dispatched_once() {
        let sink = RecordingSink::new();
        let registry = SnippetRegistry::with_builtin_snippets();

        let disposition = process_inbound(&inbound(b"simplelog", "m-1"), &registry, &sink, None);

        assert_eq!(
            disposition,
            MessageDisposition::Dispatched {
                operation: "simplelog".to_string()
            }
        );
        assert_eq!(sink.entries().len(), 1);
        assert_eq!(sink.entries()[0].text, "hi");
    }

    #[test]
    fn unknown_operation_is_a_miss_with_zero_writes() {
        let sink = RecordingSink::new();
        let registry = SnippetRegistry::with_builtin_snippets();

        let disposition =
            process_inbound(&inbound(b"doesNotExist", "m-1"), &registry, &sink, None);

        assert_eq!(
            disposition,
            MessageDisposition::DispatchMiss {
                operation: "doesNotExist".to_string()
            }
        );
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn replayed_message_id_is_not_dispatched_again() {
        let sink = RecordingSink::new();
        let registry = SnippetRegistry::with_builtin_snippets();
        let dedup = MessageDeduplicator::new(16);

        let first = process_inbound(&inbound(b"simplelog", "m-1"), &registry, &sink, Some(&dedup));
        let second =
            process_inbound(&inbound(b"simplelog", "m-1"), &registry, &sink, Some(&dedup));

        assert!(matches!(first, MessageDisposition::Dispatched { .. }));
        assert_eq!(second, MessageDisposition::DuplicateDelivery);
        assert_eq!(sink.entries().len(), 1);
    }

    #[test]
    fn duplicates_are_accepted_when_policy_is_off() {
        let sink = RecordingSink::new();
        let registry = SnippetRegistry::with_builtin_snippets();

        process_inbound(&inbound(b"simplelog", "m-1"), &registry, &sink, None);
        process_inbound(&inbound(b"simplelog", "m-1"), &registry, &sink, None);

        assert_eq!(sink.entries().len(), 2);
    }

    #[test]
    fn sink_outage_is_reported_not_raised() {
        let registry = SnippetRegistry::with_builtin_snippets();

        let disposition =
            process_inbound(&inbound(b"simplelog", "m-1"), &registry, &FailingSink, None);

        assert!(matches!(
            disposition,
            MessageDisposition::SinkFailure { ref operation, .. } if operation == "simplelog"
        ));
    }

    #[test]
    fn undecodable_payload_is_reported_not_raised() {
        let sink = RecordingSink::new();
        let registry = SnippetRegistry::with_builtin_snippets();

        let disposition =
            process_inbound(&inbound(&[0xff, 0xfe], "m-1"), &registry, &sink, None);

        assert!(matches!(disposition, MessageDisposition::DecodeFailure { .. }));
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn received_message_converts_to_inbound_contract() {
        let mut attributes = std::collections::HashMap::new();
        attributes.insert("log_name".to_string(), "mylog".to_string());

        let raw = PubsubMessage {
            data: b"simplelog".to_vec(),
            attributes,
            message_id: "wire-7".to_string(),
            ordering_key: String::new(),
            publish_time: None,
        };

        let converted = inbound_from_received(&raw);
        assert_eq!(converted.data, b"simplelog");
        assert_eq!(converted.message_id, "wire-7");
        assert_eq!(
            converted.attributes.get("log_name").map(String::as_str),
            Some("mylog")
        );
        assert_eq!(converted.publish_time, None);
    }
}
