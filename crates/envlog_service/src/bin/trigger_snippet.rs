use std::collections::HashMap;

use google_cloud_googleapis::pubsub::v1::PubsubMessage;
use google_cloud_pubsub::client::{Client, ClientConfig};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use envlog_service::adapters::metadata::{MetadataClient, DEFAULT_METADATA_ENDPOINT};
use envlog_service::config::RuntimeConfig;

/// Publish an operation name plus `key=value` attribute pairs to the
/// configured topic, triggering a snippet end-to-end.
///
/// Usage: `trigger_snippet simplelog log_name=foo log_text=bar`
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let Some(operation) = args.next() else {
        return Err("usage: trigger_snippet <operation> [key=value ...]".into());
    };

    let mut attributes = HashMap::new();
    for pair in args {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(format!("malformed attribute '{pair}' (expected key=value)").into());
        };
        attributes.insert(key.to_string(), value.to_string());
    }

    let config = RuntimeConfig::from_env();
    let project_id = match &config.project_id {
        Some(id) => id.clone(),
        None => {
            MetadataClient::new(DEFAULT_METADATA_ENDPOINT)
                .project_id()
                .await?
        }
    };

    let client = Client::new(ClientConfig {
        project_id: Some(project_id.clone()),
        ..Default::default()
    })
    .await
    .map_err(|error| format!("failed to create pub/sub client: {error}"))?;
    let ctx = CancellationToken::new();

    let topic = client.topic(&config.topic_id);
    let exists = topic
        .exists(Some(ctx.clone()), None)
        .await
        .map_err(|error| format!("failed to check topic: {error}"))?;
    if !exists {
        return Err(format!("topic '{}' does not exist", config.topic_id).into());
    }

    let mut publisher = topic.new_publisher(None);

    let mut awaiter = publisher
        .publish(PubsubMessage {
            data: operation.as_bytes().to_vec(),
            attributes,
            message_id: String::new(),
            publish_time: None,
            ordering_key: String::new(),
        })
        .await;
    let message_id = awaiter
        .get(Some(ctx))
        .await
        .map_err(|error| format!("publish failed: {error}"))?;

    publisher.shutdown().await;

    println!(
        "{}",
        json!({
            "published": operation,
            "topic": config.topic_id,
            "message_id": message_id,
        })
    );
    Ok(())
}
