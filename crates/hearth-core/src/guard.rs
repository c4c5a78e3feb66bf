//! Access-control guard.
//!
//! Pure rules over (caller, target, membership state). The guard owns no
//! state of its own; the membership fact is read from the household
//! registry at decision time. Every patient-record read/write and every
//! invitation response must pass through here.

use crate::{
  Error, Result,
  identity::{Caller, Role},
  invitation::Invitation,
  store::HouseholdStore,
};

/// Whether `caller` may read or write the record of `patient_id`, given
/// whether that patient is a member of the caller's household.
///
/// - A patient reaches only their own record.
/// - An admin reaches a record iff the patient is a current member.
pub fn record_access_allowed(
  caller: Caller,
  patient_id: i64,
  is_household_member: bool,
) -> bool {
  match caller.role {
    Role::Patient => caller.user_id == patient_id,
    Role::Admin => is_household_member,
  }
}

/// Guard a patient-record read/write, consulting the household registry
/// for the membership fact when the caller is an admin.
pub async fn ensure_record_access<S: HouseholdStore>(
  store: &S,
  caller: Caller,
  patient_id: i64,
) -> Result<()> {
  let is_member = match caller.role {
    Role::Patient => false,
    Role::Admin => {
      let household = store.get_or_create_household(caller.user_id).await?;
      store.is_member(household.household_id, patient_id).await?
    }
  };

  if record_access_allowed(caller, patient_id, is_member) {
    Ok(())
  } else {
    Err(Error::Forbidden("caller may not access this patient record"))
  }
}

/// Only the addressed patient may act on an invitation.
pub fn ensure_responder(
  invitation: &Invitation,
  caller_patient_id: i64,
) -> Result<()> {
  if invitation.patient_id == caller_patient_id {
    Ok(())
  } else {
    Err(Error::Forbidden("invitation is addressed to another patient"))
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::invitation::InvitationStatus;

  fn admin(id: i64) -> Caller {
    Caller { user_id: id, role: Role::Admin }
  }

  fn patient(id: i64) -> Caller {
    Caller { user_id: id, role: Role::Patient }
  }

  #[test]
  fn patient_reaches_only_own_record() {
    assert!(record_access_allowed(patient(42), 42, false));
    assert!(!record_access_allowed(patient(42), 43, false));
    // Membership state is irrelevant for patients.
    assert!(!record_access_allowed(patient(42), 43, true));
  }

  #[test]
  fn admin_reaches_members_only() {
    assert!(record_access_allowed(admin(1), 42, true));
    assert!(!record_access_allowed(admin(1), 42, false));
  }

  #[test]
  fn responder_must_be_the_addressed_patient() {
    let invitation = Invitation {
      invitation_id: 7,
      admin_id: 1,
      patient_id: 42,
      household_id: 3,
      status: InvitationStatus::Pending,
      created_at: Utc::now(),
      updated_at: Utc::now(),
    };

    assert!(ensure_responder(&invitation, 42).is_ok());
    assert!(matches!(
      ensure_responder(&invitation, 43),
      Err(Error::Forbidden(_))
    ));
  }
}
