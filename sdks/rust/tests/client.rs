use std::sync::Arc;

use serde_json::json;
use session_replay::AppState;
use session_replay::config::ResilienceConfig;
use session_replay::gateway::SessionGateway;
use session_replay::persistence::providers::memory::MemoryProvider;
use session_replay::server::build_app;
use session_replay_sdk::{Client, Event, Recorder, Recording};

/// Serve the real router over an in-memory store on an ephemeral port.
async fn spawn_server() -> Client {
    let store = Arc::new(MemoryProvider::new());
    let state = AppState::new(Arc::new(SessionGateway::new(store)));
    let app = build_app(state, &ResilienceConfig::default());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });

    Client::new(format!("http://{addr}")).expect("Invalid test URL")
}

#[tokio::test]
async fn health_is_ok() {
    let client = spawn_server().await;
    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.db, "connected");
}

#[tokio::test]
async fn upload_then_fetch_returns_the_recording() {
    let client = spawn_server().await;

    let recorder = Recorder::new();
    recorder.start();
    recorder.log("screen_view", "Login");
    recorder.log("tap", "Shop");
    let recording = recorder.stop();

    let created = client.sessions().upload(&recording).await.unwrap();
    assert_eq!(created.session_id, created.internal_id);

    let fetched = client.sessions().fetch(&created.session_id).await.unwrap();
    assert_eq!(fetched, recording);

    let raw = client.sessions().get(&created.internal_id).await.unwrap();
    assert_eq!(raw["sessionId"], json!(created.session_id));
}

#[tokio::test]
async fn list_update_delete_cycle() {
    let client = spawn_server().await;
    let sessions = client.sessions();

    let recording = Recording {
        started_at: 1_000,
        ended_at: 2_000,
        events: vec![Event {
            kind: "tap".into(),
            screen: "Checkout".into(),
            timestamp: 1_500,
        }],
    };
    let first = sessions.upload(&recording).await.unwrap();
    let second = sessions.create(&json!({"player": "b"})).await.unwrap();

    let page = sessions.list(Some(1)).await.unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.sessions[0]["internalId"], json!(second.internal_id));

    let page = sessions.list(None).await.unwrap();
    assert_eq!(page.count, 2);
    assert!(page.sessions.iter().all(|s| s.get("events").is_none()));

    let outcome = sessions
        .update(&first.session_id, &json!({"label": "checkout-bug"}))
        .await
        .unwrap();
    assert!(outcome.updated);
    assert_eq!(outcome.session_id, first.session_id);
    let raw = sessions.get(&first.session_id).await.unwrap();
    assert_eq!(raw["label"], json!("checkout-bug"));

    let outcome = sessions.delete(&first.session_id).await.unwrap();
    assert!(outcome.deleted);

    let err = sessions.get(&first.session_id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn api_errors_carry_the_server_message() {
    let client = spawn_server().await;
    let sessions = client.sessions();

    let err = sessions.delete("doesnotexist").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "API error (404): Session not found");

    let created = sessions.create(&json!({"player": "a"})).await.unwrap();
    let err = sessions
        .update(&created.session_id, &json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "API error (400): No data provided");
}
