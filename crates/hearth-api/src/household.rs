//! Handlers for the admin's household views.

use axum::{Json, extract::State};
use hearth_core::{
  Error,
  household::{HouseholdView, StatusBoard},
  query,
  store::HouseholdStore,
};

use crate::{ApiError, AppState, auth::Authenticated};

/// `GET /household/patients` — current members of the calling admin's
/// household, creating it lazily on first query.
pub async fn patients<S>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<HouseholdView>, ApiError>
where
  S: HouseholdStore,
{
  if !caller.is_admin() {
    return Err(Error::Forbidden("caller is not an admin").into());
  }

  let view = query::household_view(state.store.as_ref(), caller.user_id).await?;
  Ok(Json(view))
}

/// `GET /household/patient-statuses` — the dashboard's pending /
/// approved / canceled buckets.
pub async fn patient_statuses<S>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<StatusBoard>, ApiError>
where
  S: HouseholdStore,
{
  if !caller.is_admin() {
    return Err(Error::Forbidden("caller is not an admin").into());
  }

  let board =
    query::patient_status_board(state.store.as_ref(), caller.user_id).await?;
  Ok(Json(board))
}
