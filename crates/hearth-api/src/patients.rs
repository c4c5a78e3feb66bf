//! Handlers for guarded patient-record reads and writes.
//!
//! Both routes consult the access-control guard: a patient reaches only
//! their own record, an admin only current members of their household.

use axum::{
  Json,
  extract::{Path, State},
};
use hearth_core::{
  Error, guard,
  patient::{PatientProfile, ProfilePatch},
  store::HouseholdStore,
};

use crate::{ApiError, AppState, auth::Authenticated};

/// `GET /patients/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(patient_id): Path<i64>,
) -> Result<Json<PatientProfile>, ApiError>
where
  S: HouseholdStore,
{
  guard::ensure_record_access(state.store.as_ref(), caller, patient_id).await?;

  let profile = state
    .store
    .get_patient_profile(patient_id)
    .await?
    .ok_or(Error::InvalidPatient(patient_id))?;

  Ok(Json(profile))
}

/// `PUT /patients/{id}` — partial update; omitted fields are untouched.
pub async fn update_one<S>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(patient_id): Path<i64>,
  Json(patch): Json<ProfilePatch>,
) -> Result<Json<PatientProfile>, ApiError>
where
  S: HouseholdStore,
{
  guard::ensure_record_access(state.store.as_ref(), caller, patient_id).await?;

  let profile = state.store.update_patient_profile(patient_id, patch).await?;
  tracing::info!(patient_id, "patient record updated");

  Ok(Json(profile))
}
