//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, dates as `YYYY-MM-DD`, and
//! enums as the lowercase strings matching their serde tags.

use chrono::{DateTime, NaiveDate, Utc};
use hearth_core::{
  Error, Result,
  household::Household,
  identity::{Role, User},
  invitation::{Invitation, InvitationStatus},
  patient::{EmergencyContact, PatientProfile},
};

/// Wrap a transport-level failure into the core taxonomy.
pub fn db_err(e: impl std::fmt::Display) -> Error { Error::Storage(e.to_string()) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(db_err)
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> { s.parse().map_err(db_err) }

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::Admin => "admin",
    Role::Patient => "patient",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "admin" => Ok(Role::Admin),
    "patient" => Ok(Role::Patient),
    other => Err(Error::Storage(format!("unknown role: {other:?}"))),
  }
}

// ─── InvitationStatus ────────────────────────────────────────────────────────

pub fn encode_status(s: InvitationStatus) -> &'static str {
  match s {
    InvitationStatus::Pending => "pending",
    InvitationStatus::Accepted => "accepted",
    InvitationStatus::Rejected => "rejected",
  }
}

pub fn decode_status(s: &str) -> Result<InvitationStatus> {
  match s {
    "pending" => Ok(InvitationStatus::Pending),
    "accepted" => Ok(InvitationStatus::Accepted),
    "rejected" => Ok(InvitationStatus::Rejected),
    other => Err(Error::Storage(format!("unknown invitation status: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:    i64,
  pub username:   String,
  pub role:       String,
  pub created_at: String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    self.user_id,
      username:   self.username,
      role:       decode_role(&self.role)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `households` row.
pub struct RawHousehold {
  pub household_id: i64,
  pub admin_id:     i64,
  pub created_at:   String,
}

impl RawHousehold {
  pub fn into_household(self) -> Result<Household> {
    Ok(Household {
      household_id: self.household_id,
      admin_id:     self.admin_id,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `invitations` row.
pub struct RawInvitation {
  pub invitation_id: i64,
  pub admin_id:      i64,
  pub patient_id:    i64,
  pub household_id:  i64,
  pub status:        String,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawInvitation {
  pub fn into_invitation(self) -> Result<Invitation> {
    Ok(Invitation {
      invitation_id: self.invitation_id,
      admin_id:      self.admin_id,
      patient_id:    self.patient_id,
      household_id:  self.household_id,
      status:        decode_status(&self.status)?,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `patients` row.
pub struct RawProfile {
  pub patient_id:                     i64,
  pub name:                           String,
  pub surname:                        String,
  pub date_of_birth:                  Option<String>,
  pub gender:                         Option<String>,
  pub blood_type:                     Option<String>,
  pub allergies:                      Option<String>,
  pub medications:                    Option<String>,
  pub emergency_contact_name:         Option<String>,
  pub emergency_contact_relationship: Option<String>,
  pub emergency_contact_phone:        Option<String>,
}

impl RawProfile {
  pub fn into_profile(self) -> Result<PatientProfile> {
    Ok(PatientProfile {
      patient_id:        self.patient_id,
      name:              self.name,
      surname:           self.surname,
      date_of_birth:     self
        .date_of_birth
        .as_deref()
        .map(decode_date)
        .transpose()?,
      gender:            self.gender,
      blood_type:        self.blood_type,
      allergies:         self.allergies,
      medications:       self.medications,
      emergency_contact: EmergencyContact {
        name:         self.emergency_contact_name,
        relationship: self.emergency_contact_relationship,
        phone_number: self.emergency_contact_phone,
      },
    })
  }
}
