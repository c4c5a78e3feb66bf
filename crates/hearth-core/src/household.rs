//! Household records and the composed read views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::patient::PatientSummary;

/// The grouping of one admin (caregiver) and zero or more member
/// patients. A household's identity is keyed by its admin — exactly one
/// household per admin, created lazily.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
  pub household_id: i64,
  pub admin_id:     i64,
  pub created_at:   DateTime<Utc>,
}

/// Current members of a household with their profile summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdView {
  pub household_id: i64,
  pub patients:     Vec<PatientSummary>,
}

/// One invitation joined with the invited patient's summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEntry {
  pub invitation_id: i64,
  pub patient:       PatientSummary,
  /// Dashboard label: `"pending"`, `"approved"`, or `"canceled"`.
  pub status:        String,
  pub updated_at:    DateTime<Utc>,
}

/// The admin dashboard's grouped view of invitation outcomes.
///
/// "approved" and "canceled" are display aliases for the canonical
/// `accepted` / `rejected` statuses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusBoard {
  pub pending:  Vec<StatusEntry>,
  pub approved: Vec<StatusEntry>,
  pub canceled: Vec<StatusEntry>,
}
