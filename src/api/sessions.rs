//! `/sessions` handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::AppState;
use crate::api::error::ApiError;
use crate::api::extract::{QueryParams, RawBody, SessionPath};
use crate::gateway::{CreatedSession, DEFAULT_LIST_LIMIT, GatewayError, SessionPage};
use crate::persistence::Document;

const NOT_AN_OBJECT: &str = "Request body must be a JSON object";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Kept raw so a malformed value gets a `limit`-specific message.
    pub limit: Option<String>,
}

/// `null`, `false`, zero, `""` and `[]`.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(_) => false,
    }
}

/// Parse a request body that should hold a JSON object. A blank body or a
/// falsy non-object value is `None`.
fn json_object(body: &[u8]) -> Result<Option<Document>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(value) if is_falsy(&value) => Ok(None),
        Ok(_) => Err(ApiError::bad_request(NOT_AN_OBJECT)),
        Err(e) => Err(ApiError::bad_request(format!("Invalid JSON body: {e}"))),
    }
}

fn parse_limit(raw: Option<&str>) -> Result<usize, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DEFAULT_LIST_LIMIT),
        Some(value) => value.parse::<usize>().map_err(|e| {
            ApiError::bad_request(format!(
                "limit must be a non-negative integer, got {value:?}: {e}"
            ))
        }),
    }
}

/// POST /sessions - Store a new session document.
pub async fn create_session(
    State(state): State<AppState>,
    RawBody(body): RawBody,
) -> Result<(StatusCode, Json<CreatedSession>), ApiError> {
    let document = json_object(&body)?.ok_or_else(|| ApiError::bad_request(NOT_AN_OBJECT))?;
    let created = state.gateway.create(document).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /sessions/{id} - Full session, events included.
pub async fn get_session(
    State(state): State<AppState>,
    SessionPath(id): SessionPath,
) -> Result<Json<Document>, ApiError> {
    state
        .gateway
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// GET /sessions?limit=N - Newest sessions, events stripped.
pub async fn list_sessions(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Json<SessionPage>, ApiError> {
    let limit = parse_limit(query.limit.as_deref())?;
    let page = state.gateway.list(limit).await?;
    Ok(Json(page))
}

/// PUT /sessions/{id} - Merge fields into a session.
pub async fn update_session(
    State(state): State<AppState>,
    SessionPath(id): SessionPath,
    RawBody(body): RawBody,
) -> Result<Json<Value>, ApiError> {
    let document = json_object(&body)?.ok_or(GatewayError::EmptyUpdate)?;

    if state.gateway.update(&id, &document).await? {
        Ok(Json(json!({ "updated": true, "sessionId": id })))
    } else {
        Err(ApiError::not_found_with("updated"))
    }
}

/// DELETE /sessions/{id} - Remove a session.
pub async fn delete_session(
    State(state): State<AppState>,
    SessionPath(id): SessionPath,
) -> Result<Json<Value>, ApiError> {
    if state.gateway.delete(&id).await? {
        Ok(Json(json!({ "deleted": true, "sessionId": id })))
    } else {
        Err(ApiError::not_found_with("deleted"))
    }
}
