use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use chime_timer::{
    api::create_router,
    engine::TimerEngine,
    languages::Locale,
    services::{ChimeRenderer, MemorySettingsStore},
    state::{AppState, Settings},
};

#[derive(Debug)]
struct Mute;

impl ChimeRenderer for Mute {
    fn play(&self, _base_name: &str) {}
}

fn app_with(settings: Settings, locale: Locale) -> Router {
    let store = Arc::new(MemorySettingsStore::new(settings));
    let engine = TimerEngine::new(store, Arc::new(Mute), locale);
    create_router(Arc::new(AppState::new(engine, 20554, "127.0.0.1".into())))
}

fn app(minutes: i64, seconds: i64) -> Router {
    app_with(
        Settings {
            start_minutes: minutes,
            start_seconds: seconds,
            ..Settings::default()
        },
        Locale::default(),
    )
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder().method(method).uri(uri).body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// Let the settings subscription catch up with the store
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test]
async fn health_reports_healthy() {
    let app = app(2, 0);
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test(start_paused = true)]
async fn toggle_starts_and_pauses() {
    let app = app(2, 0);

    let (status, body) = send(&app, "POST", "/toggle", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["display"], "2:00");

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    let (_, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(body["timer"]["remaining_seconds"], 117);
    assert_eq!(body["display"], "1:57");
    assert_eq!(body["last_action"], "toggle");

    let (_, body) = send(&app, "POST", "/toggle", None).await;
    assert_eq!(body["status"], "stopped");
    tokio::time::sleep(Duration::from_secs(5)).await;
    let (_, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(body["timer"]["remaining_seconds"], 117);
}

#[tokio::test(start_paused = true)]
async fn double_tap_resets_without_starting() {
    let app = app(1, 30);
    send(&app, "POST", "/restart", None).await;
    tokio::time::sleep(Duration::from_millis(4_500)).await;

    let (_, body) = send(&app, "POST", "/double-tap", None).await;
    assert_eq!(body["status"], "stopped");
    assert_eq!(body["timer"]["remaining_seconds"], 90);
}

#[tokio::test(start_paused = true)]
async fn shorter_duration_offers_lower_and_confirm_applies_it() {
    let app = app(2, 0);
    send(&app, "POST", "/start", None).await;
    tokio::time::sleep(Duration::from_millis(10_500)).await;

    let (status, body) = send(&app, "POST", "/settings", Some(json!({ "minutes": 1, "seconds": 0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["confirmation"], json!({ "kind": "lower", "target": 60 }));
    assert_eq!(body["settings"]["start_minutes"], 1);
    settle().await;

    let (_, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(body["pending_confirmation"]["target"], 60);
    assert_eq!(body["timer"]["total_seconds"], 60);
    assert_eq!(body["timer"]["remaining_seconds"], 110);

    let (_, body) = send(&app, "POST", "/confirm", None).await;
    assert_eq!(body["status"], "running");
    assert_eq!(body["timer"]["remaining_seconds"], 60);

    let (_, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(body["pending_confirmation"], Value::Null);
}

#[tokio::test(start_paused = true)]
async fn dismiss_keeps_the_active_timer() {
    let app = app(2, 0);
    send(&app, "POST", "/start", None).await;
    tokio::time::sleep(Duration::from_millis(2_500)).await;

    let (_, body) = send(&app, "POST", "/settings", Some(json!({ "minutes": 1, "seconds": 30 }))).await;
    assert_eq!(body["confirmation"], json!({ "kind": "lower", "target": 90 }));
    settle().await;

    let (_, body) = send(&app, "POST", "/dismiss", None).await;
    assert_eq!(body["timer"]["remaining_seconds"], 118);
    assert_eq!(body["timer"]["total_seconds"], 90);

    let (_, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(body["pending_confirmation"], Value::Null);
    assert_eq!(body["last_action"], "dismiss");
}

#[tokio::test(start_paused = true)]
async fn switching_mode_with_new_duration_lands_on_new_total() {
    let app = app(2, 0);

    send(&app, "POST", "/settings", Some(json!({ "count_up_enabled": true }))).await;
    settle().await;
    let (_, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(body["timer"]["is_count_up"], true);
    assert_eq!(body["timer"]["remaining_seconds"], 0);

    let (_, body) = send(
        &app,
        "POST",
        "/settings",
        Some(json!({ "count_up_enabled": false, "minutes": 0, "seconds": 45 })),
    )
    .await;
    assert_eq!(body["confirmation"], Value::Null);
    settle().await;

    let (_, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(body["timer"]["is_count_up"], false);
    assert_eq!(body["timer"]["total_seconds"], 45);
    assert_eq!(body["timer"]["remaining_seconds"], 45);
}

#[tokio::test(start_paused = true)]
async fn mode_switch_with_unchanged_duration_does_not_move_a_later_pause() {
    let app = app_with(
        Settings {
            count_up_enabled: true,
            ..Settings::default()
        },
        Locale::default(),
    );

    send(
        &app,
        "POST",
        "/settings",
        Some(json!({ "count_up_enabled": false, "minutes": 2, "seconds": 0 })),
    )
    .await;
    settle().await;

    send(&app, "POST", "/toggle", None).await;
    tokio::time::sleep(Duration::from_millis(20_500)).await;
    let (_, body) = send(&app, "POST", "/toggle", None).await;
    assert_eq!(body["status"], "stopped");
    assert_eq!(body["timer"]["remaining_seconds"], 100);

    let (_, body) = send(&app, "POST", "/settings", Some(json!({ "minutes": 2, "seconds": 30 }))).await;
    assert_eq!(body["confirmation"], Value::Null);
    settle().await;

    let (_, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(body["timer"]["total_seconds"], 150);
    assert_eq!(body["timer"]["remaining_seconds"], 100);
}

#[tokio::test(start_paused = true)]
async fn blank_language_follows_device_locale() {
    let app = app_with(Settings::default(), Locale::parse("pt_BR.UTF-8"));
    let (_, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(body["timer"]["language_tag"], "pt-BR");
    assert_eq!(body["rtl"], false);

    let (_, body) = send(&app, "POST", "/settings", Some(json!({ "language_tag": "ar" }))).await;
    assert_eq!(body["settings"]["initialized"], true);
    settle().await;

    let (_, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(body["timer"]["language_tag"], "ar");
    assert_eq!(body["rtl"], true);
}

#[tokio::test]
async fn languages_are_listed_with_direction() {
    let app = app(2, 0);
    let (status, body) = send(&app, "GET", "/languages", None).await;
    assert_eq!(status, StatusCode::OK);

    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 41);
    let hebrew = entries.iter().find(|e| e["tag"] == "he").unwrap();
    assert_eq!(hebrew["rtl"], true);
    let english = entries.iter().find(|e| e["tag"] == "en").unwrap();
    assert_eq!(english["rtl"], false);
}

#[tokio::test]
async fn malformed_settings_are_rejected() {
    let app = app(2, 0);
    let (status, _) = send(&app, "POST", "/settings", Some(json!({ "minutes": "ten" }))).await;
    assert!(status.is_client_error());
}
