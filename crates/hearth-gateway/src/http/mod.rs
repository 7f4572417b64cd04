use axum::http::StatusCode;
use axum::Json;
use hearth_store::StoreError;
use serde::Serialize;

pub mod health;
pub mod shopping;
pub mod tasks;
pub mod users;

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

/// Map a store error to its HTTP shape. Database errors stay opaque to the
/// client; the real cause lands in the log via TraceLayer.
pub fn store_error(e: StoreError) -> ApiError {
    let status = match &e {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::Conflict(_) => StatusCode::CONFLICT,
        StoreError::Invalid { .. } => StatusCode::BAD_REQUEST,
        StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = match &e {
        StoreError::Database(_) => "internal error".to_string(),
        other => other.to_string(),
    };
    (status, Json(ErrorBody { error: message }))
}
