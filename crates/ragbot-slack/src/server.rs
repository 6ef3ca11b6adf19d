//! HTTP surface: Slack events endpoint plus health, ping, and notify.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::bridge::SlackBridge;
use crate::error::{SlackError, SlackResult};
use crate::events::{EventEnvelope, SlackEvent};
use crate::signature::{verify_signature, SIGNATURE_HEADER, TIMESTAMP_HEADER};

pub const RETRY_HEADER: &str = "x-slack-retry-num";
pub const DEFAULT_NOTIFY_TEXT: &str = "Hello from ragbot!";

#[derive(Clone)]
pub struct AppState {
    bridge: Arc<SlackBridge>,
    signing_secret: Arc<str>,
    default_channel: Option<Arc<str>>,
}

impl AppState {
    pub fn new(bridge: Arc<SlackBridge>, signing_secret: impl Into<String>) -> Self {
        Self {
            bridge,
            signing_secret: Arc::from(signing_secret.into()),
            default_channel: None,
        }
    }

    /// Channel `/api/notify` posts to when the request names none.
    pub fn with_default_channel(mut self, channel: Option<String>) -> Self {
        self.default_channel = channel.filter(|c| !c.trim().is_empty()).map(Arc::from);
        self
    }

    fn verify(&self, headers: &HeaderMap, body: &str) -> SlackResult<()> {
        verify_signature(
            &self.signing_secret,
            header(headers, TIMESTAMP_HEADER)?,
            body,
            header(headers, SIGNATURE_HEADER)?,
        )
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> SlackResult<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| SlackError::Signature(format!("missing {name} header")))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/ping", get(ping))
        .route("/api/notify", post(notify))
        .route("/slack/events", post(slack_events))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "Slack host listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn health() -> &'static str {
    "ok"
}

async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "ts": chrono::Utc::now().timestamp_millis() }))
}

#[derive(Debug, Default, Deserialize)]
struct NotifyRequest {
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

async fn notify(State(state): State<AppState>, body: Bytes) -> Response {
    // Unparseable bodies count as empty.
    let req: NotifyRequest = serde_json::from_slice(&body).unwrap_or_default();

    let channel = req
        .channel
        .filter(|c| !c.is_empty())
        .or_else(|| state.default_channel.as_deref().map(String::from));
    let Some(channel) = channel else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "ok": false,
                "error": "channel is required (or SLACK_DEFAULT_CHANNEL)"
            })),
        )
            .into_response();
    };
    let text = req
        .text
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_NOTIFY_TEXT.to_string());

    match state.bridge.sink().post_message(&channel, &text, None).await {
        Ok(ts) => Json(json!({ "ok": true, "channel": channel, "ts": ts })).into_response(),
        Err(e) => {
            warn!(%channel, error = %e, "Notify failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn slack_events(State(state): State<AppState>, headers: HeaderMap, body: String) -> Response {
    if let Err(e) = state.verify(&headers, &body) {
        warn!(error = %e, "Rejected Slack request");
        return (StatusCode::UNAUTHORIZED, "invalid signature").into_response();
    }

    let envelope: EventEnvelope = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "Malformed Slack payload");
            return (StatusCode::BAD_REQUEST, "malformed payload").into_response();
        }
    };

    match envelope {
        EventEnvelope::UrlVerification { challenge } => {
            info!("Answered Slack URL verification");
            Json(json!({ "challenge": challenge })).into_response()
        }
        EventEnvelope::EventCallback {
            event, event_id, ..
        } => {
            // The first delivery is already being answered.
            if let Some(retry) = headers.get(RETRY_HEADER) {
                debug!(?retry, event_id = ?event_id, "Dropping Slack retry");
                return StatusCode::OK.into_response();
            }

            match SlackEvent::from_value(event) {
                SlackEvent::AppMention(mention) => {
                    let bridge = Arc::clone(&state.bridge);
                    tokio::spawn(async move { bridge.handle_mention(mention).await });
                }
                SlackEvent::Unknown => debug!(event_id = ?event_id, "Ignoring Slack event"),
            }
            StatusCode::OK.into_response()
        }
        EventEnvelope::Unknown => StatusCode::OK.into_response(),
    }
}
