//! [`SqliteStore`] — the SQLite implementation of [`HouseholdStore`].
//!
//! The two invariants with teeth both live here, inside single
//! transactions: at most one pending invitation per (admin, patient)
//! pair, and the accept path's status flip + membership insert applied
//! atomically with a compare-and-set on `status = 'pending'`.

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use hearth_core::{
  Error, Result, guard,
  household::Household,
  identity::{Role, User},
  invitation::{Decision, Invitation, InvitationStatus},
  patient::{PatientProfile, PatientSummary, ProfilePatch},
  store::HouseholdStore,
};

use crate::{
  encode::{
    RawHousehold, RawInvitation, RawProfile, RawUser, db_err, encode_date,
    encode_dt, encode_role, encode_status,
  },
  schema::SCHEMA,
};

/// Transient lock conflicts are retried this many times before giving up.
/// Typed application failures are never retried.
const BUSY_RETRIES: u32 = 3;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Hearth household store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(db_err)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(db_err)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(db_err)
  }

  /// One attempt at `respond`; the raw transport error is kept so the
  /// caller can distinguish busy conflicts from everything else.
  async fn respond_once(
    &self,
    invitation_id: i64,
    caller_patient_id: i64,
    decision: Decision,
  ) -> std::result::Result<Result<Invitation>, tokio_rusqlite::Error> {
    let now = Utc::now();
    let now_str = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let raw = match invitation_row(&tx, invitation_id)? {
          Some(raw) => raw,
          None => return Ok(Err(Error::InvitationNotFound(invitation_id))),
        };

        let invitation = match raw.into_invitation() {
          Ok(inv) => inv,
          Err(e) => return Ok(Err(e)),
        };

        if let Err(e) = guard::ensure_responder(&invitation, caller_patient_id)
        {
          return Ok(Err(e));
        }

        let next = match invitation.transition(decision) {
          Ok(next) => next,
          Err(e) => return Ok(Err(e)),
        };

        // Compare-and-set: the losing side of a concurrent response
        // updates zero rows and observes NotPending. The membership
        // side effect below is therefore applied at most once.
        let updated = tx.execute(
          "UPDATE invitations SET status = ?1, updated_at = ?2
           WHERE invitation_id = ?3 AND status = 'pending'",
          rusqlite::params![encode_status(next), now_str, invitation_id],
        )?;
        if updated == 0 {
          return Ok(Err(Error::NotPending(invitation_id)));
        }

        if next == InvitationStatus::Accepted {
          tx.execute(
            "INSERT OR IGNORE INTO household_members
               (household_id, patient_id, added_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![
              invitation.household_id,
              invitation.patient_id,
              now_str
            ],
          )?;
        }

        tx.commit()?;

        Ok(Ok(Invitation { status: next, updated_at: now, ..invitation }))
      })
      .await
  }
}

// ─── HouseholdStore impl ─────────────────────────────────────────────────────

impl HouseholdStore for SqliteStore {
  // ── Identity directory ────────────────────────────────────────────────────

  async fn create_user(&self, username: String, role: Role) -> Result<User> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let role_str = encode_role(role);
    let is_patient = role == Role::Patient;
    let name = username.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Friendly-path check; the UNIQUE constraint backstops races.
        let taken: bool = tx
          .query_row(
            "SELECT 1 FROM users WHERE username = ?1",
            rusqlite::params![name],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(Err(Error::UsernameTaken(name)));
        }

        match tx.execute(
          "INSERT INTO users (username, role, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![name, role_str, at_str],
        ) {
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => {
            return Ok(Err(Error::UsernameTaken(name)));
          }
          Err(e) => return Err(e.into()),
        }
        let user_id = tx.last_insert_rowid();

        if is_patient {
          tx.execute(
            "INSERT INTO patients (patient_id) VALUES (?1)",
            rusqlite::params![user_id],
          )?;
        }

        tx.commit()?;
        Ok(Ok(user_id))
      })
      .await
      .map_err(db_err)?;

    let user_id = outcome?;
    tracing::debug!(user_id, role = role_str, "user created");
    Ok(User { user_id, username, role, created_at })
  }

  async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, username, role, created_at
               FROM users WHERE user_id = ?1",
              rusqlite::params![user_id],
              |row| {
                Ok(RawUser {
                  user_id:    row.get(0)?,
                  username:   row.get(1)?,
                  role:       row.get(2)?,
                  created_at: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(db_err)?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn patient_summary(
    &self,
    patient_id: i64,
  ) -> Result<Option<PatientSummary>> {
    let summary = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT u.user_id, u.username, p.name, p.surname
               FROM users u
               JOIN patients p ON p.patient_id = u.user_id
               WHERE u.user_id = ?1",
              rusqlite::params![patient_id],
              |row| {
                Ok(PatientSummary {
                  patient_id: row.get(0)?,
                  username:   row.get(1)?,
                  name:       row.get(2)?,
                  surname:    row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(db_err)?;

    Ok(summary)
  }

  async fn get_patient_profile(
    &self,
    patient_id: i64,
  ) -> Result<Option<PatientProfile>> {
    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| profile_row(conn, patient_id))
      .await
      .map_err(db_err)?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn update_patient_profile(
    &self,
    patient_id: i64,
    patch: ProfilePatch,
  ) -> Result<PatientProfile> {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let raw = match profile_row(&tx, patient_id)? {
          Some(raw) => raw,
          None => return Ok(Err(Error::InvalidPatient(patient_id))),
        };
        let profile = match raw.into_profile() {
          Ok(p) => p,
          Err(e) => return Ok(Err(e)),
        };

        let updated = patch.apply(profile);

        tx.execute(
          "UPDATE patients SET
             name = ?1, surname = ?2, date_of_birth = ?3, gender = ?4,
             blood_type = ?5, allergies = ?6, medications = ?7,
             emergency_contact_name = ?8,
             emergency_contact_relationship = ?9,
             emergency_contact_phone = ?10
           WHERE patient_id = ?11",
          rusqlite::params![
            updated.name,
            updated.surname,
            updated.date_of_birth.map(encode_date),
            updated.gender,
            updated.blood_type,
            updated.allergies,
            updated.medications,
            updated.emergency_contact.name,
            updated.emergency_contact.relationship,
            updated.emergency_contact.phone_number,
            patient_id,
          ],
        )?;

        tx.commit()?;
        Ok(Ok(updated))
      })
      .await
      .map_err(db_err)?;

    outcome
  }

  // ── Household registry ────────────────────────────────────────────────────

  async fn get_or_create_household(&self, admin_id: i64) -> Result<Household> {
    let now_str = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        match user_role(&tx, admin_id)? {
          Some(role) if role == "admin" => {}
          _ => return Ok(Err(Error::InvalidAdmin(admin_id))),
        }

        let raw = fetch_or_create_household(&tx, admin_id, &now_str)?;
        tx.commit()?;
        Ok(raw.into_household())
      })
      .await
      .map_err(db_err)?;

    outcome
  }

  async fn add_member(&self, household_id: i64, patient_id: i64) -> Result<()> {
    let now_str = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM households WHERE household_id = ?1",
            rusqlite::params![household_id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(Err(Error::HouseholdNotFound(household_id)));
        }

        match user_role(&tx, patient_id)? {
          Some(role) if role == "patient" => {}
          _ => return Ok(Err(Error::InvalidPatient(patient_id))),
        }

        // Idempotent: re-adding a present member is a no-op.
        tx.execute(
          "INSERT OR IGNORE INTO household_members
             (household_id, patient_id, added_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![household_id, patient_id, now_str],
        )?;

        tx.commit()?;
        Ok(Ok(()))
      })
      .await
      .map_err(db_err)?;

    outcome
  }

  async fn list_members(&self, household_id: i64) -> Result<Vec<PatientSummary>> {
    let members = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT u.user_id, u.username, p.name, p.surname
           FROM household_members m
           JOIN users u    ON u.user_id    = m.patient_id
           JOIN patients p ON p.patient_id = m.patient_id
           WHERE m.household_id = ?1
           ORDER BY m.added_at, u.user_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![household_id], |row| {
            Ok(PatientSummary {
              patient_id: row.get(0)?,
              username:   row.get(1)?,
              name:       row.get(2)?,
              surname:    row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    Ok(members)
  }

  async fn is_member(&self, household_id: i64, patient_id: i64) -> Result<bool> {
    let member = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM household_members
               WHERE household_id = ?1 AND patient_id = ?2",
              rusqlite::params![household_id, patient_id],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await
      .map_err(db_err)?;

    Ok(member)
  }

  // ── Invitation ledger ─────────────────────────────────────────────────────

  async fn create_invitation(
    &self,
    admin_id: i64,
    patient_id: i64,
  ) -> Result<Invitation> {
    let now = Utc::now();
    let now_str = encode_dt(now);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        match user_role(&tx, admin_id)? {
          Some(role) if role == "admin" => {}
          _ => return Ok(Err(Error::InvalidAdmin(admin_id))),
        }

        // An id that is missing or resolves to an admin account is
        // equally uninvitable.
        match user_role(&tx, patient_id)? {
          Some(role) if role == "patient" => {}
          _ => return Ok(Err(Error::InvalidPatient(patient_id))),
        }

        let household = fetch_or_create_household(&tx, admin_id, &now_str)?;

        if member_exists(&tx, household.household_id, patient_id)? {
          return Ok(Err(Error::AlreadyMember(patient_id)));
        }

        let pending: bool = tx
          .query_row(
            "SELECT 1 FROM invitations
             WHERE admin_id = ?1 AND patient_id = ?2 AND status = 'pending'",
            rusqlite::params![admin_id, patient_id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if pending {
          return Ok(Err(Error::DuplicatePending { admin_id, patient_id }));
        }

        // The partial unique index backstops the check above: a raced
        // insert fails the constraint instead of duplicating the row.
        match tx.execute(
          "INSERT INTO invitations
             (admin_id, patient_id, household_id, status, created_at, updated_at)
           VALUES (?1, ?2, ?3, 'pending', ?4, ?4)",
          rusqlite::params![
            admin_id,
            patient_id,
            household.household_id,
            now_str
          ],
        ) {
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => {
            return Ok(Err(Error::DuplicatePending { admin_id, patient_id }));
          }
          Err(e) => return Err(e.into()),
        }

        let invitation_id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Ok(Invitation {
          invitation_id,
          admin_id,
          patient_id,
          household_id: household.household_id,
          status: InvitationStatus::Pending,
          created_at: now,
          updated_at: now,
        }))
      })
      .await
      .map_err(db_err)?;

    outcome
  }

  async fn respond(
    &self,
    invitation_id: i64,
    caller_patient_id: i64,
    decision: Decision,
  ) -> Result<Invitation> {
    let mut attempts = 0;
    loop {
      match self
        .respond_once(invitation_id, caller_patient_id, decision)
        .await
      {
        Ok(outcome) => return outcome,
        Err(e) if is_busy(&e) && attempts < BUSY_RETRIES => {
          attempts += 1;
          tracing::warn!(invitation_id, attempts, "database busy, retrying");
        }
        Err(e) => return Err(db_err(e)),
      }
    }
  }

  async fn invitations_for_patient(
    &self,
    patient_id: i64,
  ) -> Result<Vec<Invitation>> {
    let raws: Vec<RawInvitation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT invitation_id, admin_id, patient_id, household_id,
                  status, created_at, updated_at
           FROM invitations
           WHERE patient_id = ?1
           ORDER BY created_at DESC, invitation_id DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![patient_id], raw_invitation)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawInvitation::into_invitation).collect()
  }

  async fn invitations_for_admin(&self, admin_id: i64) -> Result<Vec<Invitation>> {
    let raws: Vec<RawInvitation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT invitation_id, admin_id, patient_id, household_id,
                  status, created_at, updated_at
           FROM invitations
           WHERE admin_id = ?1
           ORDER BY created_at DESC, invitation_id DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![admin_id], raw_invitation)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawInvitation::into_invitation).collect()
  }
}

// ─── Row helpers (run inside `conn.call` closures) ───────────────────────────

fn user_role(
  conn: &rusqlite::Connection,
  user_id: i64,
) -> rusqlite::Result<Option<String>> {
  conn
    .query_row(
      "SELECT role FROM users WHERE user_id = ?1",
      rusqlite::params![user_id],
      |row| row.get(0),
    )
    .optional()
}

/// Lazy household creation shared by the registry and the ledger.
fn fetch_or_create_household(
  conn: &rusqlite::Connection,
  admin_id: i64,
  now_str: &str,
) -> rusqlite::Result<RawHousehold> {
  let existing = conn
    .query_row(
      "SELECT household_id, admin_id, created_at
       FROM households WHERE admin_id = ?1",
      rusqlite::params![admin_id],
      |row| {
        Ok(RawHousehold {
          household_id: row.get(0)?,
          admin_id:     row.get(1)?,
          created_at:   row.get(2)?,
        })
      },
    )
    .optional()?;

  if let Some(raw) = existing {
    return Ok(raw);
  }

  conn.execute(
    "INSERT INTO households (admin_id, created_at) VALUES (?1, ?2)",
    rusqlite::params![admin_id, now_str],
  )?;

  Ok(RawHousehold {
    household_id: conn.last_insert_rowid(),
    admin_id,
    created_at: now_str.to_owned(),
  })
}

fn member_exists(
  conn: &rusqlite::Connection,
  household_id: i64,
  patient_id: i64,
) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM household_members
         WHERE household_id = ?1 AND patient_id = ?2",
        rusqlite::params![household_id, patient_id],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

fn invitation_row(
  conn: &rusqlite::Connection,
  invitation_id: i64,
) -> rusqlite::Result<Option<RawInvitation>> {
  conn
    .query_row(
      "SELECT invitation_id, admin_id, patient_id, household_id,
              status, created_at, updated_at
       FROM invitations WHERE invitation_id = ?1",
      rusqlite::params![invitation_id],
      raw_invitation,
    )
    .optional()
}

fn raw_invitation(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawInvitation> {
  Ok(RawInvitation {
    invitation_id: row.get(0)?,
    admin_id:      row.get(1)?,
    patient_id:    row.get(2)?,
    household_id:  row.get(3)?,
    status:        row.get(4)?,
    created_at:    row.get(5)?,
    updated_at:    row.get(6)?,
  })
}

fn profile_row(
  conn: &rusqlite::Connection,
  patient_id: i64,
) -> tokio_rusqlite::Result<Option<RawProfile>> {
  Ok(
    conn
      .query_row(
        "SELECT patient_id, name, surname, date_of_birth, gender,
                blood_type, allergies, medications,
                emergency_contact_name, emergency_contact_relationship,
                emergency_contact_phone
         FROM patients WHERE patient_id = ?1",
        rusqlite::params![patient_id],
        |row| {
          Ok(RawProfile {
            patient_id:                     row.get(0)?,
            name:                           row.get(1)?,
            surname:                        row.get(2)?,
            date_of_birth:                  row.get(3)?,
            gender:                         row.get(4)?,
            blood_type:                     row.get(5)?,
            allergies:                      row.get(6)?,
            medications:                    row.get(7)?,
            emergency_contact_name:         row.get(8)?,
            emergency_contact_relationship: row.get(9)?,
            emergency_contact_phone:        row.get(10)?,
          })
        },
      )
      .optional()?,
  )
}

// ─── Error classification ────────────────────────────────────────────────────

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.code == rusqlite::ErrorCode::ConstraintViolation
  )
}

fn is_busy(e: &tokio_rusqlite::Error) -> bool {
  matches!(
    e,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(f, _))
      if f.code == rusqlite::ErrorCode::DatabaseBusy
        || f.code == rusqlite::ErrorCode::DatabaseLocked
  )
}
