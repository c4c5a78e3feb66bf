//! The `HouseholdStore` trait — the persistence seam for the household
//! registry, invitation ledger, and identity directory.
//!
//! The trait is implemented by storage backends (e.g.
//! `hearth-store-sqlite`). Higher layers (`hearth-api`, the query
//! service, the access-control guard) depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use crate::{
  Result,
  household::Household,
  identity::{Role, User},
  invitation::{Decision, Invitation},
  patient::{PatientProfile, PatientSummary, ProfilePatch},
};

/// Abstraction over a Hearth storage backend.
///
/// Mutations go through exactly two owners: invitation rows through the
/// ledger methods, household and member rows through the registry
/// methods. Read methods never mutate. Backends surface transport
/// failures as [`Error::Storage`](crate::Error::Storage); every other
/// variant of the taxonomy is a typed application failure with the
/// semantics documented per method.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait HouseholdStore: Send + Sync {
  // ── Identity directory ────────────────────────────────────────────────

  /// Create an account. A patient account also gets an empty record row.
  ///
  /// Fails with `UsernameTaken` if the username is already in use.
  fn create_user(
    &self,
    username: String,
    role: Role,
  ) -> impl Future<Output = Result<User>> + Send + '_;

  /// Resolve a user id to its account. `None` if it does not resolve.
  fn get_user(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<Option<User>>> + Send + '_;

  /// Summary (id, username, display name) for a single patient.
  /// `None` if the id does not resolve to a patient account.
  fn patient_summary(
    &self,
    patient_id: i64,
  ) -> impl Future<Output = Result<Option<PatientSummary>>> + Send + '_;

  /// Fetch a patient's record. `None` if the id is not a patient.
  ///
  /// Callers are responsible for consulting the access-control guard
  /// first; the store itself does not authorize reads.
  fn get_patient_profile(
    &self,
    patient_id: i64,
  ) -> impl Future<Output = Result<Option<PatientProfile>>> + Send + '_;

  /// Apply a partial update to a patient's record and return the result.
  ///
  /// Fails with `InvalidPatient` if the id does not resolve to a patient.
  fn update_patient_profile(
    &self,
    patient_id: i64,
    patch: ProfilePatch,
  ) -> impl Future<Output = Result<PatientProfile>> + Send + '_;

  // ── Household registry ────────────────────────────────────────────────

  /// The admin's household, created lazily on first use. Idempotent — an
  /// admin has exactly one household.
  ///
  /// Fails with `InvalidAdmin` if the id does not resolve to an admin.
  fn get_or_create_household(
    &self,
    admin_id: i64,
  ) -> impl Future<Output = Result<Household>> + Send + '_;

  /// Add a patient to a household. Idempotent: adding a member that is
  /// already present is a no-op, which keeps the invitation-accept path
  /// safely retryable.
  ///
  /// Fails with `HouseholdNotFound` or `InvalidPatient`.
  fn add_member(
    &self,
    household_id: i64,
    patient_id: i64,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Current members of a household.
  fn list_members(
    &self,
    household_id: i64,
  ) -> impl Future<Output = Result<Vec<PatientSummary>>> + Send + '_;

  /// Whether `patient_id` is currently a member of `household_id`.
  fn is_member(
    &self,
    household_id: i64,
    patient_id: i64,
  ) -> impl Future<Output = Result<bool>> + Send + '_;

  // ── Invitation ledger ─────────────────────────────────────────────────

  /// Record a new pending invitation from `admin_id` to `patient_id`,
  /// creating the admin's household lazily if needed.
  ///
  /// Fails with `InvalidAdmin`, `InvalidPatient` (missing id, or the id
  /// belongs to an admin), `AlreadyMember`, or `DuplicatePending`. The
  /// duplicate check is atomic with respect to concurrent creations for
  /// the same pair — a race never produces two pending rows.
  fn create_invitation(
    &self,
    admin_id: i64,
    patient_id: i64,
  ) -> impl Future<Output = Result<Invitation>> + Send + '_;

  /// Resolve a pending invitation as the invited patient.
  ///
  /// On accept, the status transition and the household-membership
  /// insert are applied in one transaction: a reader never observes an
  /// accepted invitation whose patient is not a member. Concurrent
  /// responses to the same invitation are mutually exclusive — only the
  /// first succeeds, the loser observes `NotPending`.
  ///
  /// Fails with `InvitationNotFound`, `Forbidden` (caller is not the
  /// addressed patient), or `NotPending`.
  fn respond(
    &self,
    invitation_id: i64,
    caller_patient_id: i64,
    decision: Decision,
  ) -> impl Future<Output = Result<Invitation>> + Send + '_;

  /// All invitations addressed to `patient_id`, most recent first.
  fn invitations_for_patient(
    &self,
    patient_id: i64,
  ) -> impl Future<Output = Result<Vec<Invitation>>> + Send + '_;

  /// All invitations issued by `admin_id`, most recent first.
  fn invitations_for_admin(
    &self,
    admin_id: i64,
  ) -> impl Future<Output = Result<Vec<Invitation>>> + Send + '_;
}
