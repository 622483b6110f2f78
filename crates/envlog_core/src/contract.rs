use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::dispatch_error::DecodeError;
use crate::severity::Severity;

/// Attribute key supplying the entry text.
pub const LOG_TEXT_ATTRIBUTE: &str = "log_text";
/// Attribute key supplying the target log stream name.
pub const LOG_NAME_ATTRIBUTE: &str = "log_name";
/// Attribute key supplying the entry severity.
pub const SEVERITY_ATTRIBUTE: &str = "severity";

/// Entry text used when `log_text` is absent.
pub const DEFAULT_LOG_TEXT: &str = "simplelog";
/// Log stream name used when `log_name` is absent.
pub const DEFAULT_LOG_NAME: &str = "test";
/// Payload substituted by the function-trigger variant when a message
/// arrives with no data at all.
pub const FALLBACK_PAYLOAD: &str = "hello world";

pub type Attributes = BTreeMap<String, String>;

/// A message as handed to the dispatcher, already stripped of transport
/// framing. Read-only from the dispatcher's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub data: Vec<u8>,
    pub attributes: Attributes,
    pub message_id: String,
    pub publish_time: Option<String>,
}

impl InboundMessage {
    /// Decode the payload bytes into an operation name.
    ///
    /// The payload is UTF-8 text; an empty payload yields the empty string.
    /// Invalid UTF-8 is a decode failure and is never recovered here.
    pub fn operation_name(&self) -> Result<String, DecodeError> {
        Ok(String::from_utf8(self.data.clone())?)
    }
}

/// Wire format of an HTTP push delivery: the envelope posted by the managed
/// transport to a push endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushEnvelope {
    pub message: PushMessage,
    #[serde(default)]
    pub subscription: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushMessage {
    /// Base64-encoded payload text; absent when the publisher sent no data.
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default, alias = "messageId")]
    pub message_id: String,
    #[serde(default, alias = "publishTime")]
    pub publish_time: Option<String>,
}

impl PushEnvelope {
    /// Unwrap the envelope into an [`InboundMessage`], base64-decoding the
    /// payload. Malformed base64 surfaces as a decode failure.
    pub fn into_inbound_message(self) -> Result<InboundMessage, DecodeError> {
        let data = match self.message.data {
            Some(encoded) => BASE64_STANDARD.decode(encoded)?,
            None => Vec::new(),
        };

        Ok(InboundMessage {
            data,
            attributes: self.message.attributes,
            message_id: self.message.message_id,
            publish_time: self.message.publish_time,
        })
    }
}

/// A single structured log entry: constructed, written once, discarded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    pub text: String,
    pub log_name: String,
    pub severity: Severity,
}

impl LogEntry {
    /// Build an entry from message attributes, substituting the documented
    /// defaults for any recognized key the mapping omits.
    pub fn from_attributes(attributes: &Attributes) -> Self {
        let text = attributes
            .get(LOG_TEXT_ATTRIBUTE)
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOG_TEXT.to_string());
        let log_name = attributes
            .get(LOG_NAME_ATTRIBUTE)
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOG_NAME.to_string());
        let severity =
            Severity::parse_or_default(attributes.get(SEVERITY_ATTRIBUTE).map(String::as_str));

        Self {
            text,
            log_name,
            severity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_with_payload(payload: &[u8]) -> InboundMessage {
        InboundMessage {
            data: payload.to_vec(),
            attributes: Attributes::new(),
            message_id: "m-1".to_string(),
            publish_time: None,
        }
    }

    #[test]
    fn operation_name_decodes_utf8_payload() {
        let message = message_with_payload(b"simplelog");
        assert_eq!(
            message.operation_name().expect("payload should decode"),
            "simplelog"
        );
    }

    #[test]
    fn operation_name_decoding_is_idempotent() {
        let message = message_with_payload(b"simplelog");
        let first = message.operation_name().expect("payload should decode");
        let second = message.operation_name().expect("payload should decode");
        assert_eq!(first, second);
    }

    #[test]
    fn empty_payload_decodes_to_empty_name() {
        let message = message_with_payload(b"");
        assert_eq!(message.operation_name().expect("empty payload decodes"), "");
    }

    #[test]
    fn invalid_utf8_payload_is_a_decode_failure() {
        let message = message_with_payload(&[0xff, 0xfe]);
        let error = message
            .operation_name()
            .expect_err("invalid UTF-8 should fail");
        assert!(error.to_string().contains("not valid UTF-8"));
    }

    #[test]
    fn push_envelope_unwraps_base64_payload() {
        let envelope = PushEnvelope {
            message: PushMessage {
                data: Some("c2ltcGxlbG9n".to_string()),
                attributes: Attributes::from([(
                    "log_text".to_string(),
                    "hi".to_string(),
                )]),
                message_id: "push-1".to_string(),
                publish_time: Some("2026-02-14T00:00:00Z".to_string()),
            },
            subscription: "projects/p/subscriptions/s".to_string(),
        };

        let inbound = envelope
            .into_inbound_message()
            .expect("envelope should unwrap");
        assert_eq!(inbound.data, b"simplelog");
        assert_eq!(inbound.message_id, "push-1");
        assert_eq!(inbound.attributes.get("log_text").map(String::as_str), Some("hi"));
    }

    #[test]
    fn push_envelope_without_data_yields_empty_payload() {
        let envelope = PushEnvelope {
            message: PushMessage {
                data: None,
                attributes: Attributes::new(),
                message_id: String::new(),
                publish_time: None,
            },
            subscription: String::new(),
        };

        let inbound = envelope
            .into_inbound_message()
            .expect("absent data should unwrap");
        assert!(inbound.data.is_empty());
    }

    #[test]
    fn push_envelope_rejects_malformed_base64() {
        let envelope = PushEnvelope {
            message: PushMessage {
                data: Some("%%not-base64%%".to_string()),
                attributes: Attributes::new(),
                message_id: String::new(),
                publish_time: None,
            },
            subscription: String::new(),
        };

        let error = envelope
            .into_inbound_message()
            .expect_err("malformed base64 should fail");
        assert!(error.to_string().contains("not valid base64"));
    }

    #[test]
    fn push_envelope_parses_camel_case_field_names() {
        let raw = serde_json::json!({
            "message": {
                "data": "c2ltcGxlbG9n",
                "attributes": {"log_name": "mylog"},
                "messageId": "42",
                "publishTime": "2026-02-14T00:00:00Z"
            },
            "subscription": "projects/p/subscriptions/s"
        });

        let envelope: PushEnvelope =
            serde_json::from_value(raw).expect("envelope should parse");
        assert_eq!(envelope.message.message_id, "42");
        assert_eq!(
            envelope.message.publish_time.as_deref(),
            Some("2026-02-14T00:00:00Z")
        );
    }

    #[test]
    fn entry_uses_attribute_values_when_present() {
        let attributes = Attributes::from([
            ("log_text".to_string(), "hi".to_string()),
            ("log_name".to_string(), "mylog".to_string()),
            ("severity".to_string(), "ERROR".to_string()),
        ]);

        let entry = LogEntry::from_attributes(&attributes);
        assert_eq!(entry.text, "hi");
        assert_eq!(entry.log_name, "mylog");
        assert_eq!(entry.severity, Severity::Error);
    }

    #[test]
    fn entry_substitutes_documented_defaults() {
        let entry = LogEntry::from_attributes(&Attributes::new());
        assert_eq!(entry.text, DEFAULT_LOG_TEXT);
        assert_eq!(entry.log_name, DEFAULT_LOG_NAME);
        assert_eq!(entry.severity, Severity::Default);
    }

    #[test]
    fn unrecognized_attribute_keys_are_ignored() {
        let attributes = Attributes::from([
            ("log_text".to_string(), "hi".to_string()),
            ("color".to_string(), "green".to_string()),
        ]);

        let entry = LogEntry::from_attributes(&attributes);
        assert_eq!(entry.text, "hi");
        assert_eq!(entry.log_name, DEFAULT_LOG_NAME);
    }
}
