//! Session Replay Server
//!
//! Entry point for the session document service.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use dotenvy::dotenv;
use session_replay::{config::AppConfig, server::start_server, telemetry};

#[tokio::main]
async fn main() {
    // Load .env (if present) before anything reads the environment
    let _ = dotenv();

    // Initialize tracing (M-LOG-STRUCTURED)
    telemetry::init();

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = start_server(Arc::new(config)).await {
        tracing::error!(name: "server.failed", error = ?e, "Server failed");
        std::process::exit(1);
    }
}
