//! JSON REST API for the Hearth household service.
//!
//! Exposes an axum [`Router`] backed by any
//! [`hearth_core::store::HouseholdStore`]. Token issuance lives outside
//! this service: the router is handed an [`auth::IdentityResolver`] that
//! turns opaque bearer tokens into resolved callers, and handlers receive
//! the caller as an explicit request context.

pub mod auth;
pub mod error;
pub mod household;
pub mod invitations;
pub mod patients;
pub mod users;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use hearth_core::store::HouseholdStore;
use serde::Deserialize;

use auth::IdentityResolver;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Static bearer-token table; stands in for the external identity
  /// provider in single-node deployments.
  #[serde(default)]
  pub tokens:     Vec<auth::TokenEntry>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub identity: Arc<dyn IdentityResolver>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      identity: Arc::clone(&self.identity),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: HouseholdStore + 'static,
{
  Router::new()
    // Registration (open; credential issuance is external)
    .route("/users", post(users::create::<S>))
    // Invitation ledger
    .route("/create-invitation", post(invitations::create::<S>))
    .route("/respond-invitation", post(invitations::respond::<S>))
    .route("/invitations", get(invitations::list::<S>))
    // Membership queries
    .route("/household/patients", get(household::patients::<S>))
    .route(
      "/household/patient-statuses",
      get(household::patient_statuses::<S>),
    )
    // Guarded patient records
    .route(
      "/patients/{id}",
      get(patients::get_one::<S>).put(patients::update_one::<S>),
    )
    .with_state(state)
}

#[cfg(test)]
mod tests;
