//! Handler for account registration.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use hearth_core::{Error, identity::Role, store::HouseholdStore};
use serde::Deserialize;

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub username: String,
  pub role:     Role,
}

/// `POST /users` — body `{"username": "...", "role": "admin"|"patient"}`.
///
/// Open, like the original sign-up flow; credential issuance is handled
/// by the external identity provider. A patient account also gets an
/// empty record row.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: HouseholdStore,
{
  let username = body.username.trim();
  if username.is_empty() {
    return Err(
      Error::InvalidInput("username must not be empty".into()).into(),
    );
  }

  let user = state.store.create_user(username.to_owned(), body.role).await?;
  tracing::info!(user_id = user.user_id, role = ?user.role, "user created");

  Ok((StatusCode::CREATED, Json(user)))
}
