//! Session Replay Service
//!
//! A small HTTP/JSON service storing recorded UI sessions as schema-less
//! documents, with create/read/update/delete/list operations.
//!
//! # Architecture
//!
//! - **Server**: Axum router with trace, CORS, body-limit and timeout layers
//! - **Gateway**: operation handlers sharing one identifier-resolution policy
//!   (native id first, then the application-level `sessionId`)
//! - **Persistence**: `SessionStore` trait with in-memory and PostgreSQL
//!   providers
//!
//! # Modules
//!
//! - [`api`]: HTTP handlers and JSON error mapping
//! - [`config`]: layered configuration (defaults, file, env, CLI)
//! - [`gateway`]: identifier resolution and the session operations
//! - [`persistence`]: store trait, native ids, providers
//! - [`server`]: application assembly and startup
//! - [`telemetry`]: structured logging setup

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod api;
pub mod config;
pub mod gateway;
pub mod persistence;
pub mod server;
pub mod telemetry;

use gateway::SessionGateway;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Session operations over the configured store.
    pub gateway: Arc<SessionGateway>,
}

impl AppState {
    pub fn new(gateway: Arc<SessionGateway>) -> Self {
        Self { gateway }
    }
}
