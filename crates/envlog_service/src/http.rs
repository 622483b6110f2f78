use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde_json::json;

use crate::adapters::log_sink::LogSink;
use crate::handlers::dispatch::{dispatch, SnippetRegistry};
use crate::runtime::contract::PushEnvelope;
use crate::runtime::dispatch_error::DispatchError;

/// Shared state for the HTTP surface.
pub struct GatewayState {
    pub registry: SnippetRegistry,
    pub sink: Arc<dyn LogSink + Send + Sync>,
}

/// `GET /` is a liveness probe; `POST /` is push-style message intake.
pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/", get(liveness).post(pubsub_push))
        .with_state(state)
}

/// Static acknowledgment, independent of messaging state.
async fn liveness() -> &'static str {
    "Hello World!"
}

/// Accept a pub/sub push envelope, decode it, and dispatch. A well-formed
/// envelope is answered 204 regardless of dispatch outcome; the transport
/// must not redeliver a message we consumed.
async fn pubsub_push(
    State(state): State<Arc<GatewayState>>,
    body: Bytes,
) -> (StatusCode, String) {
    if body.is_empty() {
        log_gateway_error("empty_push_body", json!({}));
        return (
            StatusCode::BAD_REQUEST,
            "Bad Request: no Pub/Sub message received".to_string(),
        );
    }

    let envelope: PushEnvelope = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(error) => {
            log_gateway_error("malformed_push_envelope", json!({"error": error.to_string()}));
            return (
                StatusCode::BAD_REQUEST,
                "Bad Request: invalid Pub/Sub message format".to_string(),
            );
        }
    };

    let inbound = match envelope.into_inbound_message() {
        Ok(value) => value,
        Err(error) => {
            log_gateway_error("undecodable_push_payload", json!({"error": error.to_string()}));
            return (
                StatusCode::BAD_REQUEST,
                "Bad Request: invalid Pub/Sub message format".to_string(),
            );
        }
    };

    match dispatch(&state.registry, &inbound, state.sink.as_ref()) {
        Ok(dispatched) => log_gateway_info(
            "snippet_dispatched",
            json!({
                "operation": dispatched.operation,
                "message_id": inbound.message_id,
            }),
        ),
        Err(DispatchError::UnknownOperation { name }) => log_gateway_info(
            "dispatch_miss",
            json!({
                "operation": name,
                "message_id": inbound.message_id,
            }),
        ),
        Err(error) => log_gateway_error(
            "dispatch_failed",
            json!({
                "message_id": inbound.message_id,
                "error": error.to_string(),
            }),
        ),
    }

    (StatusCode::NO_CONTENT, String::new())
}

fn log_gateway_info(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "http_gateway",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

fn log_gateway_error(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "http_gateway",
            "level": "error",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}
