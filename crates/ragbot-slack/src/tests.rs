use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use ragbot_ai::{
    AiError, AnswerCapability, Generation, GenerationOptions, Reply, Role, SessionStore, Turn,
    TurnOrchestrator,
};
use ragbot_common::ConversationKey;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::bridge::{CLEARED, GENERATION_FAILED, GREETING, NOT_CONFIGURED};
use crate::events::AppMentionEvent;
use crate::server::{DEFAULT_NOTIFY_TEXT, RETRY_HEADER};
use crate::signature::{sign, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::{router, AppState, MessageSink, SlackBridge, SlackError, SlackResult};

const SECRET: &str = "test-signing-secret";

/// Answers `echo: <last user turn>`, or fails when the text contains "boom".
struct EchoBackend;

#[async_trait]
impl AnswerCapability for EchoBackend {
    async fn generate(
        &self,
        _key: &ConversationKey,
        turns: &[Turn],
        _options: &GenerationOptions,
    ) -> Result<Generation, AiError> {
        let last = turns.last().map(|t| t.text.clone()).unwrap_or_default();
        if last.contains("boom") {
            return Err(AiError::ApiError("HTTP 500: boom".into()));
        }
        if last.contains("silence") {
            return Ok(Generation::Text(String::new()));
        }
        Ok(Generation::Text(format!("echo: {last}")))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Posted {
    channel: String,
    text: String,
    thread_ts: Option<String>,
}

#[derive(Default)]
struct RecordingSink {
    posted: Mutex<Vec<Posted>>,
    fail_with: Option<String>,
}

impl RecordingSink {
    fn failing(error: &str) -> Self {
        Self {
            fail_with: Some(error.to_string()),
            ..Self::default()
        }
    }

    fn posted(&self) -> Vec<Posted> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> SlackResult<String> {
        if let Some(error) = &self.fail_with {
            return Err(SlackError::Api(error.clone()));
        }
        let mut posted = self.posted.lock().unwrap();
        posted.push(Posted {
            channel: channel.to_string(),
            text: text.to_string(),
            thread_ts: thread_ts.map(String::from),
        });
        Ok(format!("1700000000.{:06}", posted.len()))
    }
}

fn orchestrator(with_backend: bool) -> Arc<TurnOrchestrator> {
    let mut orchestrator = TurnOrchestrator::new(SessionStore::new());
    if with_backend {
        orchestrator = orchestrator.with_capability(Arc::new(EchoBackend));
    }
    Arc::new(orchestrator)
}

fn bridge_with(sink: Arc<RecordingSink>, with_backend: bool) -> Arc<SlackBridge> {
    Arc::new(SlackBridge::new(orchestrator(with_backend), sink))
}

fn mention(text: &str, ts: &str, thread_ts: Option<&str>) -> AppMentionEvent {
    AppMentionEvent {
        user: Some("U1".into()),
        text: text.into(),
        channel: "C1".into(),
        ts: ts.into(),
        thread_ts: thread_ts.map(String::from),
        bot_id: None,
    }
}

fn app(sink: Arc<RecordingSink>, default_channel: Option<&str>) -> Router {
    let state = AppState::new(bridge_with(sink, true), SECRET)
        .with_default_channel(default_channel.map(String::from));
    router(state)
}

fn signed_event(body: &Value) -> Request<Body> {
    let body = body.to_string();
    let ts = chrono::Utc::now().timestamp().to_string();
    let sig = sign(SECRET, &ts, &body).unwrap();
    Request::builder()
        .method("POST")
        .uri("/slack/events")
        .header("content-type", "application/json")
        .header(TIMESTAMP_HEADER, ts)
        .header(SIGNATURE_HEADER, sig)
        .body(Body::from(body))
        .unwrap()
}

fn mention_callback(text: &str) -> Value {
    json!({
        "type": "event_callback",
        "team_id": "T1",
        "event_id": "Ev1",
        "event": {
            "type": "app_mention",
            "user": "U1",
            "text": text,
            "channel": "C1",
            "ts": "1700000000.000100"
        }
    })
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn wait_for_posts(sink: &RecordingSink, count: usize) -> Vec<Posted> {
    for _ in 0..100 {
        let posted = sink.posted();
        if posted.len() >= count {
            return posted;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    sink.posted()
}

// --- bridge ---

#[tokio::test]
async fn mention_is_answered_in_thread() {
    let sink = Arc::new(RecordingSink::default());
    let bridge = bridge_with(sink.clone(), true);

    bridge
        .handle_mention(mention("<@UBOT> what is the topic?", "1.000100", None))
        .await;

    assert_eq!(
        sink.posted(),
        vec![Posted {
            channel: "C1".into(),
            text: "echo: what is the topic?".into(),
            thread_ts: Some("1.000100".into()),
        }]
    );
    let history = bridge.orchestrator().history(&ConversationKey::new("1.000100"));
    assert_eq!(history.len(), 2);
    assert_eq!(history[0], Turn::user("what is the topic?"));
}

#[tokio::test]
async fn replies_in_a_thread_share_one_conversation() {
    let sink = Arc::new(RecordingSink::default());
    let bridge = bridge_with(sink.clone(), true);

    bridge.handle_mention(mention("<@UBOT> first", "1.0", None)).await;
    bridge
        .handle_mention(mention("<@UBOT> second", "2.0", Some("1.0")))
        .await;

    let history = bridge.orchestrator().history(&ConversationKey::new("1.0"));
    assert_eq!(history.len(), 4);
    assert_eq!(history[2], Turn::user("second"));
    assert!(sink.posted().iter().all(|p| p.thread_ts.as_deref() == Some("1.0")));
}

#[tokio::test]
async fn bare_mention_gets_greeting_without_touching_history() {
    let sink = Arc::new(RecordingSink::default());
    let bridge = bridge_with(sink, true);
    let key = ConversationKey::new("1.0");

    assert_eq!(bridge.respond(&key, "<@UBOT>   ").await, GREETING);
    assert!(bridge.orchestrator().history(&key).is_empty());
}

#[tokio::test]
async fn generation_failure_posts_apology_and_rolls_back() {
    let sink = Arc::new(RecordingSink::default());
    let bridge = bridge_with(sink, true);
    let key = ConversationKey::new("1.0");

    assert_eq!(bridge.respond(&key, "<@UBOT> hello").await, "echo: hello");
    assert_eq!(bridge.respond(&key, "<@UBOT> boom").await, GENERATION_FAILED);

    let history = bridge.orchestrator().history(&key);
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role, Role::Assistant);
}

#[tokio::test]
async fn empty_answer_posts_no_response_notice() {
    let bridge = bridge_with(Arc::new(RecordingSink::default()), true);
    let key = ConversationKey::new("1.0");

    assert_eq!(
        bridge.respond(&key, "<@UBOT> silence").await,
        Reply::NO_RESPONSE_TEXT
    );
    assert_eq!(bridge.orchestrator().history(&key), vec![Turn::user("silence")]);
}

#[tokio::test]
async fn missing_backend_posts_configuration_notice() {
    let bridge = bridge_with(Arc::new(RecordingSink::default()), false);
    let key = ConversationKey::new("1.0");

    assert_eq!(bridge.respond(&key, "<@UBOT> hello").await, NOT_CONFIGURED);
    assert!(bridge.orchestrator().history(&key).is_empty());
}

#[tokio::test]
async fn clear_and_history_commands() {
    let bridge = bridge_with(Arc::new(RecordingSink::default()), true);
    let key = ConversationKey::new("1.0");

    bridge.respond(&key, "<@UBOT> hello").await;
    let listing = bridge.respond(&key, "<@UBOT> history").await;
    assert!(listing.contains("1. 👤 User: hello"));
    assert!(listing.contains("2. 🤖 Assistant: echo: hello"));
    // Commands are not recorded as turns.
    assert_eq!(bridge.orchestrator().history(&key).len(), 2);

    assert_eq!(bridge.respond(&key, "<@UBOT> clear").await, CLEARED);
    assert!(bridge.orchestrator().history(&key).is_empty());
}

#[tokio::test]
async fn bot_mentions_are_ignored() {
    let sink = Arc::new(RecordingSink::default());
    let bridge = bridge_with(sink.clone(), true);
    let mut event = mention("<@UBOT> hi", "1.0", None);
    event.bot_id = Some("B1".into());

    bridge.handle_mention(event).await;
    assert!(sink.posted().is_empty());
}

#[tokio::test]
async fn post_failure_keeps_committed_turns() {
    let bridge = bridge_with(Arc::new(RecordingSink::failing("not_in_channel")), true);

    bridge.handle_mention(mention("<@UBOT> hi", "1.0", None)).await;
    assert_eq!(
        bridge.orchestrator().history(&ConversationKey::new("1.0")).len(),
        2
    );
}

// --- routes ---

#[tokio::test]
async fn health_returns_ok() {
    let resp = app(Arc::new(RecordingSink::default()), None)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn ping_returns_millisecond_timestamp() {
    let before = chrono::Utc::now().timestamp_millis();
    let resp = app(Arc::new(RecordingSink::default()), None)
        .oneshot(Request::get("/api/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["ok"], true);
    assert!(json["ts"].as_i64().unwrap() >= before);
}

#[tokio::test]
async fn notify_requires_a_channel() {
    let resp = app(Arc::new(RecordingSink::default()), None)
        .oneshot(
            Request::post("/api/notify")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"text":"hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["ok"], false);
}

#[tokio::test]
async fn notify_falls_back_to_default_channel_and_text() {
    let sink = Arc::new(RecordingSink::default());
    let resp = app(sink.clone(), Some("C-default"))
        .oneshot(Request::post("/api/notify").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["channel"], "C-default");
    assert_eq!(json["ts"], "1700000000.000001");
    assert_eq!(sink.posted()[0].text, DEFAULT_NOTIFY_TEXT);
    assert_eq!(sink.posted()[0].thread_ts, None);
}

#[tokio::test]
async fn notify_reports_slack_errors() {
    let resp = app(Arc::new(RecordingSink::failing("channel_not_found")), None)
        .oneshot(
            Request::post("/api/notify")
                .body(Body::from(r#"{"channel":"C9","text":"hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "Slack API error: channel_not_found");
}

#[tokio::test]
async fn url_verification_echoes_challenge() {
    let resp = app(Arc::new(RecordingSink::default()), None)
        .oneshot(signed_event(
            &json!({"type": "url_verification", "challenge": "3eZbrw1a"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"challenge": "3eZbrw1a"}));
}

#[tokio::test]
async fn unsigned_events_are_rejected() {
    let sink = Arc::new(RecordingSink::default());
    let mut req = signed_event(&mention_callback("<@UBOT> hi"));
    req.headers_mut()
        .insert(SIGNATURE_HEADER, "v0=deadbeef".parse().unwrap());

    let resp = app(sink.clone(), None).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let missing = Request::post("/slack/events")
        .body(Body::from(mention_callback("<@UBOT> hi").to_string()))
        .unwrap();
    let resp = app(sink.clone(), None).oneshot(missing).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(sink.posted().is_empty());
}

#[tokio::test]
async fn mention_event_is_acked_then_answered() {
    let sink = Arc::new(RecordingSink::default());
    let resp = app(sink.clone(), None)
        .oneshot(signed_event(&mention_callback("<@UBOT> hello there")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let posted = wait_for_posts(&sink, 1).await;
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].text, "echo: hello there");
    assert_eq!(posted[0].thread_ts.as_deref(), Some("1700000000.000100"));
}

#[tokio::test]
async fn retried_deliveries_are_acked_and_dropped() {
    let sink = Arc::new(RecordingSink::default());
    let mut req = signed_event(&mention_callback("<@UBOT> hello"));
    req.headers_mut().insert(RETRY_HEADER, "1".parse().unwrap());

    let resp = app(sink.clone(), None).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(sink.posted().is_empty());
}

#[tokio::test]
async fn malformed_signed_payload_is_bad_request() {
    let body = "not json";
    let ts = chrono::Utc::now().timestamp().to_string();
    let req = Request::post("/slack/events")
        .header(TIMESTAMP_HEADER, ts.as_str())
        .header(SIGNATURE_HEADER, sign(SECRET, &ts, body).unwrap())
        .body(Body::from(body))
        .unwrap();

    let resp = app(Arc::new(RecordingSink::default()), None)
        .oneshot(req)
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
