//! HTTP surface of the session service.
//!
//! | Method | Path              | Handler                            |
//! |--------|-------------------|------------------------------------|
//! | GET    | `/health`         | [`health::health_check`]           |
//! | POST   | `/sessions`       | [`sessions::create_session`]       |
//! | GET    | `/sessions`       | [`sessions::list_sessions`]        |
//! | GET    | `/sessions/{id}`  | [`sessions::get_session`]          |
//! | PUT    | `/sessions/{id}`  | [`sessions::update_session`]       |
//! | DELETE | `/sessions/{id}`  | [`sessions::delete_session`]       |

use axum::{
    Json, Router,
    http::StatusCode,
    routing::get,
};
use serde_json::{Value, json};

use crate::AppState;

pub mod error;
pub mod extract;
pub mod health;
pub mod sessions;

pub use error::ApiError;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/sessions",
            get(sessions::list_sessions).post(sessions::create_session),
        )
        .route(
            "/sessions/{id}",
            get(sessions::get_session)
                .put(sessions::update_session)
                .delete(sessions::delete_session),
        )
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
}

async fn route_not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

async fn method_not_allowed() -> (StatusCode, Json<Value>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
}
