//! Caller identity and account roles.
//!
//! Token issuance and validation are external concerns; this crate only
//! consumes the resolved `(user_id, role)` pair. The pair travels as an
//! explicit [`Caller`] value on every operation rather than being read
//! from ambient session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role an account carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Patient,
}

/// A registered account as seen by the identity directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:    i64,
  pub username:   String,
  pub role:       Role,
  pub created_at: DateTime<Utc>,
}

/// The authenticated identity invoking an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
  pub user_id: i64,
  pub role:    Role,
}

impl Caller {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }

  pub fn is_patient(&self) -> bool { self.role == Role::Patient }
}
