//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use hearth_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("missing or malformed bearer token")]
  Unauthorized,

  #[error(transparent)]
  Core(#[from] CoreError),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Core(e) => match e {
        CoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        CoreError::InvalidAdmin(_)
        | CoreError::InvalidPatient(_)
        | CoreError::InvitationNotFound(_)
        | CoreError::HouseholdNotFound(_) => StatusCode::NOT_FOUND,
        CoreError::DuplicatePending { .. }
        | CoreError::AlreadyMember(_)
        | CoreError::NotPending(_)
        | CoreError::UsernameTaken(_) => StatusCode::CONFLICT,
        CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
        CoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    };

    let message = match &self {
      // Transport detail goes to the logs, not the wire.
      ApiError::Core(CoreError::Storage(detail)) => {
        tracing::error!(%detail, "storage failure");
        "internal error".to_owned()
      }
      other => other.to_string(),
    };

    (status, Json(json!({ "error": message }))).into_response()
  }
}
