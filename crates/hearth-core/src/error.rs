//! Error taxonomy for the household invitation subsystem.
//!
//! Every variant except [`Error::Storage`] is a typed application failure
//! returned to the caller; none are silently swallowed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("user {0} does not resolve to an admin account")]
  InvalidAdmin(i64),

  #[error("user {0} does not resolve to a patient account")]
  InvalidPatient(i64),

  #[error("an invitation from admin {admin_id} to patient {patient_id} is already pending")]
  DuplicatePending { admin_id: i64, patient_id: i64 },

  #[error("patient {0} is already in the household")]
  AlreadyMember(i64),

  #[error("invitation not found: {0}")]
  InvitationNotFound(i64),

  #[error("household not found: {0}")]
  HouseholdNotFound(i64),

  #[error("invitation {0} has already been resolved")]
  NotPending(i64),

  #[error("username already used: {0}")]
  UsernameTaken(String),

  #[error("forbidden: {0}")]
  Forbidden(&'static str),

  /// Transport-level failure surfaced by a storage backend.
  #[error("storage error: {0}")]
  Storage(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
