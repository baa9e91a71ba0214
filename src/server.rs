use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Request},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tracing::info;

use crate::AppState;
use crate::api;
use crate::config::{AppConfig, ResilienceConfig};
use crate::gateway::SessionGateway;
use crate::persistence;

/// Assemble the router with its middleware stack.
pub fn build_app(state: AppState, resilience: &ResilienceConfig) -> Router {
    // A disabled timeout is a very long one, which keeps the layer stack's
    // type identical either way.
    let timeout_duration = if resilience.timeout_disabled {
        Duration::from_secs(365 * 24 * 60 * 60) // 1 year
    } else {
        Duration::from_secs(resilience.request_timeout_secs)
    };

    api::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(resilience.body_limit_bytes))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| {
                let duration = timeout_duration;
                async move {
                    match tokio::time::timeout(duration, next.run(req)).await {
                        Ok(res) => res,
                        Err(_) => (
                            StatusCode::REQUEST_TIMEOUT,
                            Json(json!({ "error": "Request timed out" })),
                        )
                            .into_response(),
                    }
                }
            },
        ))
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let store = persistence::connect(&config.persistence).await?;
    info!(
        name: "store.connected",
        provider = ?config.persistence.provider,
        "Session store ready"
    );

    let state = AppState::new(Arc::new(SessionGateway::new(store)));
    let app = build_app(state, &config.resilience);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(name: "server.stopped", "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
