//! Membership query service — stateless read composition over the
//! household registry and the invitation ledger.
//!
//! Holds no state of its own; both functions are pure reads and safe to
//! re-run after any local mutation (the observed refetch-on-action
//! pattern — no push channel).

use crate::{
  Error, Result,
  household::{HouseholdView, StatusBoard, StatusEntry},
  invitation::InvitationStatus,
  store::HouseholdStore,
};

/// "Patients in my household": registry membership joined with profile
/// summaries. Creates the household lazily on first query.
pub async fn household_view<S: HouseholdStore>(
  store: &S,
  admin_id: i64,
) -> Result<HouseholdView> {
  let household = store.get_or_create_household(admin_id).await?;
  let patients = store.list_members(household.household_id).await?;
  Ok(HouseholdView { household_id: household.household_id, patients })
}

/// The admin dashboard's pending / approved / canceled buckets: the
/// ledger's invitations joined with patient summaries. Entries within a
/// bucket keep the ledger's most-recent-first order.
pub async fn patient_status_board<S: HouseholdStore>(
  store: &S,
  admin_id: i64,
) -> Result<StatusBoard> {
  // Resolves the admin (and creates the household lazily) so a bogus
  // admin id fails with InvalidAdmin rather than an empty board.
  store.get_or_create_household(admin_id).await?;

  let invitations = store.invitations_for_admin(admin_id).await?;

  let mut board = StatusBoard::default();
  for invitation in invitations {
    let patient = store
      .patient_summary(invitation.patient_id)
      .await?
      .ok_or(Error::InvalidPatient(invitation.patient_id))?;

    let entry = StatusEntry {
      invitation_id: invitation.invitation_id,
      patient,
      status: invitation.status.dashboard_label().to_owned(),
      updated_at: invitation.updated_at,
    };

    match invitation.status {
      InvitationStatus::Pending => board.pending.push(entry),
      InvitationStatus::Accepted => board.approved.push(entry),
      InvitationStatus::Rejected => board.canceled.push(entry),
    }
  }

  Ok(board)
}
