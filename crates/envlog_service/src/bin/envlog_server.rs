use std::sync::Arc;

use google_cloud_pubsub::client::{Client, ClientConfig};
use serde_json::json;

use envlog_service::adapters::cloud_logging::CloudLoggingSink;
use envlog_service::adapters::log_sink::LogSink;
use envlog_service::adapters::metadata::{MetadataClient, DEFAULT_METADATA_ENDPOINT};
use envlog_service::config::RuntimeConfig;
use envlog_service::dedup::{MessageDeduplicator, DEFAULT_DEDUP_CAPACITY};
use envlog_service::handlers::dispatch::SnippetRegistry;
use envlog_service::http::{router, GatewayState};
use envlog_service::subscriber::{SubscriberService, DEFAULT_LISTEN_WINDOW};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = RuntimeConfig::from_env();
    log_server_info(
        "starting",
        json!({
            "enable_subscriber": config.enable_subscriber,
            "run_server": config.run_server,
            "topic": config.topic_id,
            "port": config.port,
            "deduplicate": config.deduplicate,
        }),
    );

    let metadata = MetadataClient::new(DEFAULT_METADATA_ENDPOINT);
    let project_id = match &config.project_id {
        Some(id) => id.clone(),
        None => metadata.project_id().await?,
    };

    let sink: Arc<dyn LogSink + Send + Sync> = Arc::new(CloudLoggingSink::new(
        project_id.clone(),
        metadata.clone(),
        config.synchronicity,
    ));

    if config.enable_subscriber {
        let client = Client::new(ClientConfig {
            project_id: Some(project_id.clone()),
            ..Default::default()
        })
            .await
            .map_err(|error| format!("failed to create pub/sub client: {error}"))?;
        let dedup = config
            .deduplicate
            .then(|| Arc::new(MessageDeduplicator::new(DEFAULT_DEDUP_CAPACITY)));
        let service = SubscriberService::new(
            client,
            config.topic_id.clone(),
            config.subscription_id(),
            Arc::new(SnippetRegistry::with_builtin_snippets()),
            sink.clone(),
            dedup,
        );
        service.ensure_subscription().await?;

        if config.run_server {
            tokio::spawn(async move {
                if let Err(error) = service.run().await {
                    log_server_error("subscriber_stopped", json!({ "error": error }));
                }
            });
        } else if let Err(error) = service.run_for(DEFAULT_LISTEN_WINDOW).await {
            log_server_error("subscriber_stopped", json!({ "error": error }));
        }
    }

    if config.run_server {
        let state = Arc::new(GatewayState {
            registry: SnippetRegistry::with_builtin_snippets(),
            sink,
        });
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
        log_server_info("http_listening", json!({ "port": config.port }));

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router(state)).await?;
    }

    Ok(())
}

fn log_server_info(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "envlog_server",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

fn log_server_error(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "envlog_server",
            "level": "error",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}
