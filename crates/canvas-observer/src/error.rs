//! Error types for the canvas HTTP layer.
//!
//! [`ObserverError`] unifies engine refusals and request validation
//! failures into a single enum that converts into an Axum response via
//! its [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use canvas_core::CanvasError;
use canvas_types::ColorParseError;

/// Errors that can occur in the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The engine refused the operation.
    #[error(transparent)]
    Canvas(#[from] CanvasError),

    /// The colour is not one of the palette entries.
    #[error(transparent)]
    InvalidColor(#[from] ColorParseError),

    /// A boost request carried no transaction id.
    #[error("transaction_id is required")]
    MissingTransaction,

    /// The request body could not be decoded or is semantically unusable.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ObserverError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Canvas(e) => match e {
                CanvasError::NotRegistered { .. } => StatusCode::FORBIDDEN,
                CanvasError::OutOfBounds { .. } | CanvasError::InvalidLevel { .. } => {
                    StatusCode::BAD_REQUEST
                }
                CanvasError::NoCellAtPosition { .. } => StatusCode::NOT_FOUND,
                CanvasError::RoundExhausted { .. } => StatusCode::CONFLICT,
                CanvasError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
            },
            Self::InvalidColor(_) | Self::MissingTransaction | Self::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Canvas(e) => e.kind(),
            Self::InvalidColor(_) => "invalid_color",
            Self::MissingTransaction => "missing_transaction",
            Self::InvalidRequest(_) => "invalid_request",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
        }
    }
}

/// Body decode failures (bad JSON, wrong content type, non-integer
/// coordinates) answer with the same JSON error body as every other refusal.
impl From<JsonRejection> for ObserverError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
