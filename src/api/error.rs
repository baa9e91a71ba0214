//! JSON error responses.
//!
//! Every failure leaves the service as a JSON object carrying an `error`
//! message; not-found outcomes of mutating endpoints also carry their boolean
//! flag (`{"updated": false, ...}`).

use axum::{
    Json,
    extract::rejection::{BytesRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::gateway::GatewayError;

pub const SESSION_NOT_FOUND: &str = "Session not found";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    /// `flag` names the boolean set to `false` in the body, if any.
    #[error("Session not found")]
    NotFound { flag: Option<&'static str> },

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),

    /// An extractor refused the request; its status is kept.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub const fn not_found() -> Self {
        Self::NotFound { flag: None }
    }

    pub const fn not_found_with(flag: &'static str) -> Self {
        Self::NotFound { flag: Some(flag) }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Rejected { status, .. } => *status,
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::EmptyUpdate => Self::bad_request(GatewayError::EmptyUpdate.to_string()),
            GatewayError::Store(source) => Self::Internal(source),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(source) = &self {
            tracing::error!(name: "store.fault", error = ?source, "Session store operation failed");
        }

        let mut body = Map::new();
        if let Self::NotFound { flag: Some(flag) } = &self {
            body.insert((*flag).to_string(), Value::Bool(false));
        }
        body.insert("error".to_string(), Value::String(self.to_string()));

        (self.status(), Json(Value::Object(body))).into_response()
    }
}
