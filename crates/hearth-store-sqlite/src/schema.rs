//! SQL schema for the Hearth SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE,
    role        TEXT NOT NULL,   -- 'admin' | 'patient'
    created_at  TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

-- One record row per patient account, created empty at registration.
CREATE TABLE IF NOT EXISTS patients (
    patient_id                     INTEGER PRIMARY KEY REFERENCES users(user_id),
    name                           TEXT NOT NULL DEFAULT '',
    surname                        TEXT NOT NULL DEFAULT '',
    date_of_birth                  TEXT,
    gender                         TEXT,
    blood_type                     TEXT,
    allergies                      TEXT,
    medications                    TEXT,
    emergency_contact_name         TEXT,
    emergency_contact_relationship TEXT,
    emergency_contact_phone        TEXT
);

-- Exactly one household per admin, created lazily.
CREATE TABLE IF NOT EXISTS households (
    household_id INTEGER PRIMARY KEY AUTOINCREMENT,
    admin_id     INTEGER NOT NULL UNIQUE REFERENCES users(user_id),
    created_at   TEXT NOT NULL
);

-- The authoritative membership set. The composite key makes
-- INSERT OR IGNORE an idempotent add.
CREATE TABLE IF NOT EXISTS household_members (
    household_id INTEGER NOT NULL REFERENCES households(household_id),
    patient_id   INTEGER NOT NULL REFERENCES users(user_id),
    added_at     TEXT NOT NULL,
    PRIMARY KEY (household_id, patient_id)
);

CREATE TABLE IF NOT EXISTS invitations (
    invitation_id INTEGER PRIMARY KEY AUTOINCREMENT,
    admin_id      INTEGER NOT NULL REFERENCES users(user_id),
    patient_id    INTEGER NOT NULL REFERENCES users(user_id),
    household_id  INTEGER NOT NULL REFERENCES households(household_id),
    status        TEXT NOT NULL DEFAULT 'pending',  -- 'pending' | 'accepted' | 'rejected'
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- At most one pending invitation per (admin, patient) pair. This is the
-- serialization point for concurrent create-invitation calls.
CREATE UNIQUE INDEX IF NOT EXISTS invitations_pending_idx
    ON invitations(admin_id, patient_id) WHERE status = 'pending';

CREATE INDEX IF NOT EXISTS invitations_patient_idx ON invitations(patient_id);
CREATE INDEX IF NOT EXISTS invitations_admin_idx   ON invitations(admin_id);

PRAGMA user_version = 1;
";
