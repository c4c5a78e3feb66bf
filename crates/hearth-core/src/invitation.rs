//! Invitation records and their three-state lifecycle.
//!
//! `pending` is the only non-terminal state; `accepted` and `rejected`
//! are both final. The admin dashboard relabels the terminal states
//! ("approved" / "canceled") but the canonical vocabulary stays
//! three-valued — the aliases exist purely for display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
  Pending,
  Accepted,
  Rejected,
}

impl InvitationStatus {
  pub fn is_terminal(self) -> bool { !matches!(self, Self::Pending) }

  /// The label the admin dashboard uses for this status bucket.
  pub fn dashboard_label(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Accepted => "approved",
      Self::Rejected => "canceled",
    }
  }
}

// ─── Decision ────────────────────────────────────────────────────────────────

/// A patient's answer to a pending invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
  Accept,
  Reject,
}

impl Decision {
  /// The terminal status this decision resolves a pending invitation to.
  pub fn resolves_to(self) -> InvitationStatus {
    match self {
      Self::Accept => InvitationStatus::Accepted,
      Self::Reject => InvitationStatus::Rejected,
    }
  }
}

// ─── Invitation ──────────────────────────────────────────────────────────────

/// A proposed membership change from an admin to a specific patient.
///
/// Created `pending`; mutated exactly once by the invited patient's
/// response; terminal after that. At most one pending invitation may
/// exist per (admin, patient) pair at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
  pub invitation_id: i64,
  pub admin_id:      i64,
  pub patient_id:    i64,
  pub household_id:  i64,
  pub status:        InvitationStatus,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl Invitation {
  /// Validate the pending → terminal transition for `decision`.
  ///
  /// Terminal states refuse all further transitions: no double-accept and
  /// no resurrecting a rejected invitation.
  pub fn transition(&self, decision: Decision) -> Result<InvitationStatus> {
    match self.status {
      InvitationStatus::Pending => Ok(decision.resolves_to()),
      _ => Err(Error::NotPending(self.invitation_id)),
    }
  }
}
