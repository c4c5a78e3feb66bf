//! Handlers for invitation creation, response, and the patient's inbox.
//!
//! | Method | Path | Caller |
//! |--------|------|--------|
//! | `POST` | `/create-invitation` | the admin named in the body |
//! | `POST` | `/respond-invitation` | the invited patient |
//! | `GET`  | `/invitations` | any patient (own inbox) |

use axum::{Json, extract::State};
use hearth_core::{Error, invitation::Decision, store::HouseholdStore};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{ApiError, AppState, auth::Authenticated};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub admin_id:   i64,
  pub patient_id: i64,
}

/// `POST /create-invitation` — body `{"admin_id": .., "patient_id": ..}`.
///
/// The authenticated caller must be the admin named in the body; the id
/// in the payload is kept for wire compatibility, not trusted for
/// authorization.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<CreateBody>,
) -> Result<Json<Value>, ApiError>
where
  S: HouseholdStore,
{
  if !caller.is_admin() || caller.user_id != body.admin_id {
    return Err(
      Error::Forbidden("only the household admin may invite").into(),
    );
  }

  let invitation = state
    .store
    .create_invitation(body.admin_id, body.patient_id)
    .await?;

  tracing::info!(
    invitation_id = invitation.invitation_id,
    admin_id = invitation.admin_id,
    patient_id = invitation.patient_id,
    "invitation created"
  );

  Ok(Json(json!({
    "success": "invitation created",
    "invitation_id": invitation.invitation_id,
  })))
}

// ─── Respond ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RespondBody {
  pub invitation_id: i64,
  pub response:      Decision,
}

/// `POST /respond-invitation` — body
/// `{"invitation_id": .., "response": "accept"|"reject"}`.
pub async fn respond<S>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<RespondBody>,
) -> Result<Json<Value>, ApiError>
where
  S: HouseholdStore,
{
  if !caller.is_patient() {
    return Err(
      Error::Forbidden("only patients respond to invitations").into(),
    );
  }

  let invitation = state
    .store
    .respond(body.invitation_id, caller.user_id, body.response)
    .await?;

  tracing::info!(
    invitation_id = invitation.invitation_id,
    status = invitation.status.dashboard_label(),
    "invitation resolved"
  );

  Ok(Json(json!({ "success": "invitation processed" })))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /invitations` — all invitations addressed to the calling patient,
/// most recent first.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Value>, ApiError>
where
  S: HouseholdStore,
{
  if !caller.is_patient() {
    return Err(Error::Forbidden("caller is not a patient").into());
  }

  let invitations = state.store.invitations_for_patient(caller.user_id).await?;
  Ok(Json(json!({ "invitations": invitations })))
}
