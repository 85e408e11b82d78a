//! Integration tests for the assistant and bridge flows through the public API.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use antigravity_bridge::{BridgeConfig, BridgePoller, BridgeQueue};
use antigravity_core::channel::recording::RecordingChannel;
use antigravity_core::{system_prompt_for, InboundMessage, Settings, TextFormat, WorkMode};
use antigravity_llm::{LlmAdapter, ModelConfig, ScriptedBackend, RATE_LIMITED_REPLY};
use antigravity_telegram::handlers::handle_text;
use antigravity_telegram::{BotState, MessageRouter, TextHandler};
use tempfile::TempDir;
use tokio::sync::watch;

fn settings(bot_mode: &str, dir: &TempDir) -> Settings {
    let work_dir = dir.path().display().to_string();
    let bridge_dir = dir.path().join("bridge").display().to_string();
    let mode = bot_mode.to_string();
    Settings::from_lookup(move |key| match key {
        "TELEGRAM_BOT_TOKEN" => Some("123:abc".to_string()),
        "BOT_MODE" => Some(mode.clone()),
        "LLM_BACKEND" => Some("ollama".to_string()),
        "WORK_DIR" => Some(work_dir.clone()),
        "BRIDGE_DIR" => Some(bridge_dir.clone()),
        _ => None,
    })
    .unwrap()
}

#[tokio::test]
async fn test_plan_message_end_to_end() {
    let dir = TempDir::new().unwrap();
    let channel = Arc::new(RecordingChannel::new());
    let backend = Arc::new(ScriptedBackend::replying("1. Fix the date\n2. Announce"));
    let router = MessageRouter::new(
        LlmAdapter::new(backend.clone(), ModelConfig::new("llama3.2")),
        channel.clone(),
    );
    let state = BotState::with_handler(
        settings("assistant", &dir),
        channel.clone(),
        TextHandler::Assistant(router),
    );

    let msg = InboundMessage::new(42, "Ada", "can you help me plan the launch");
    handle_text(&state, &msg).await.unwrap();

    let request = &backend.requests()[0];
    assert_eq!(request.mode, WorkMode::Plan);
    assert_eq!(request.system, system_prompt_for(WorkMode::Plan));
    assert_eq!(request.user, "can you help me plan the launch");

    let sent = channel.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.starts_with("📋 *Mode: Plan*\n\n"));
    assert!(sent[0].text.ends_with("2. Announce"));
    assert_eq!(sent[0].format, TextFormat::Markdown);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_backend_reports_wait_message() {
    let dir = TempDir::new().unwrap();
    let channel = Arc::new(RecordingChannel::new());
    let backend = Arc::new(ScriptedBackend::new(
        std::iter::repeat_with(ScriptedBackend::rate_limited).take(3),
    ));
    let router = MessageRouter::new(
        LlmAdapter::new(backend.clone(), ModelConfig::new("llama3.2")),
        channel.clone(),
    );
    let state = BotState::with_handler(
        settings("assistant", &dir),
        channel.clone(),
        TextHandler::Assistant(router),
    );

    handle_text(&state, &InboundMessage::new(1, "Ada", "hi there"))
        .await
        .unwrap();

    assert_eq!(backend.calls(), 3);
    assert_eq!(channel.sent()[0].text, RATE_LIMITED_REPLY);
}

#[tokio::test]
async fn test_bridge_round_trip() {
    let dir = TempDir::new().unwrap();
    let channel = Arc::new(RecordingChannel::new());
    let state = BotState::new(settings("bridge", &dir), channel.clone()).unwrap();
    let queue: BridgeQueue = state.bridge_queue().cloned().unwrap();

    handle_text(&state, &InboundMessage::new(77, "Ada", "what's the build status?"))
        .await
        .unwrap();
    assert_eq!(queue.recipient().unwrap(), Some(77));

    // The relay process answers through the outbox.
    fs::write(queue.config().outbox_dir().join("1700000000000.txt"), "Build is green.").unwrap();

    let poll_queue = BridgeQueue::new(
        BridgeConfig::new(queue.config().root()).with_poll_interval(Duration::from_millis(10)),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = BridgePoller::new(poll_queue, channel.clone(), shutdown_rx);
    let report = poller.poll_once().await.unwrap();
    drop(shutdown_tx);

    assert_eq!(report.delivered, 1);
    let sent = channel.sent();
    assert_eq!(sent.last().unwrap().chat_id, 77);
    assert_eq!(sent.last().unwrap().text, "Build is green.");
    assert!(queue.pending().unwrap().is_empty());
}

#[test]
fn test_assistant_mode_requires_backend_credentials() {
    let dir = TempDir::new().unwrap();
    let work_dir = dir.path().display().to_string();
    let result = Settings::from_lookup(move |key| match key {
        "TELEGRAM_BOT_TOKEN" => Some("123:abc".to_string()),
        "LLM_BACKEND" => Some("gemini".to_string()),
        "WORK_DIR" => Some(work_dir.clone()),
        _ => None,
    });
    assert!(result.is_err());
}
