use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ledger_core::{constants::MSG_MISSING_VALUES, LedgerError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or ill-typed request fields.
    #[error("missing values: {detail}")]
    MalformedRequest { detail: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn missing(fields: &[&str]) -> Self {
        Self::MalformedRequest {
            detail: format!("missing {}", fields.join(", ")),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedRequest {
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MalformedRequest { detail } => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": MSG_MISSING_VALUES, "detail": detail })),
            )
                .into_response(),
            other => {
                error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": other.to_string() })),
                )
                    .into_response()
            }
        }
    }
}
