//! Patient record types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Emergency contact details attached to a patient record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
  pub name:         Option<String>,
  pub relationship: Option<String>,
  pub phone_number: Option<String>,
}

/// The full patient record guarded by household membership.
///
/// Created empty when a patient account is registered; filled in later by
/// the patient or an authorized household admin. Never hard-deleted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientProfile {
  pub patient_id:        i64,
  pub name:              String,
  pub surname:           String,
  pub date_of_birth:     Option<NaiveDate>,
  pub gender:            Option<String>,
  pub blood_type:        Option<String>,
  pub allergies:         Option<String>,
  pub medications:       Option<String>,
  pub emergency_contact: EmergencyContact,
}

/// Partial update to a patient record; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
  pub name:              Option<String>,
  pub surname:           Option<String>,
  pub date_of_birth:     Option<NaiveDate>,
  pub gender:            Option<String>,
  pub blood_type:        Option<String>,
  pub allergies:         Option<String>,
  pub medications:       Option<String>,
  pub emergency_contact: Option<EmergencyContact>,
}

impl ProfilePatch {
  /// Apply this patch over an existing record.
  pub fn apply(self, mut profile: PatientProfile) -> PatientProfile {
    if let Some(v) = self.name {
      profile.name = v;
    }
    if let Some(v) = self.surname {
      profile.surname = v;
    }
    if let Some(v) = self.date_of_birth {
      profile.date_of_birth = Some(v);
    }
    if let Some(v) = self.gender {
      profile.gender = Some(v);
    }
    if let Some(v) = self.blood_type {
      profile.blood_type = Some(v);
    }
    if let Some(v) = self.allergies {
      profile.allergies = Some(v);
    }
    if let Some(v) = self.medications {
      profile.medications = Some(v);
    }
    if let Some(v) = self.emergency_contact {
      profile.emergency_contact = v;
    }
    profile
  }
}

/// Identity plus display name, used in household and dashboard listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSummary {
  pub patient_id: i64,
  pub username:   String,
  pub name:       String,
  pub surname:    String,
}
