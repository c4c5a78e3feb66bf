//! Bearer-token caller extraction.
//!
//! Token issuance and validation live outside this service. The router
//! is configured with an [`IdentityResolver`] that maps an opaque bearer
//! token to a resolved [`Caller`]; handlers receive the caller as an
//! explicit request context instead of reading ambient session state.

use std::collections::HashMap;

use axum::{
  extract::FromRequestParts,
  http::{header, request::Parts},
};
use hearth_core::{
  identity::{Caller, Role},
  store::HouseholdStore,
};
use serde::Deserialize;

use crate::{ApiError, AppState};

/// Maps opaque bearer tokens to resolved callers.
pub trait IdentityResolver: Send + Sync {
  fn resolve(&self, token: &str) -> Option<Caller>;
}

/// One row of the static token table in `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenEntry {
  pub token:   String,
  pub user_id: i64,
  pub role:    Role,
}

/// Static token table; stands in for an external identity provider.
pub struct StaticTokens {
  tokens: HashMap<String, Caller>,
}

impl StaticTokens {
  pub fn new(entries: impl IntoIterator<Item = TokenEntry>) -> Self {
    let tokens = entries
      .into_iter()
      .map(|e| (e.token, Caller { user_id: e.user_id, role: e.role }))
      .collect();
    Self { tokens }
  }
}

impl IdentityResolver for StaticTokens {
  fn resolve(&self, token: &str) -> Option<Caller> {
    self.tokens.get(token).copied()
  }
}

/// Extractor: the authenticated caller for this request.
pub struct Authenticated(pub Caller);

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: HouseholdStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let header_val = parts
      .headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthorized)?;

    let token = header_val
      .strip_prefix("Bearer ")
      .ok_or(ApiError::Unauthorized)?;

    let caller = state
      .identity
      .resolve(token)
      .ok_or(ApiError::Unauthorized)?;

    Ok(Authenticated(caller))
  }
}
