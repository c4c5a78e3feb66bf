//! Router-level tests driving the full stack against an in-memory store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use hearth_core::{
  identity::{Caller, Role},
  store::HouseholdStore,
};
use hearth_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, auth::IdentityResolver, router};

/// Resolves tokens of the form `admin-<id>` / `patient-<id>` — the test
/// stand-in for the external identity provider.
struct TestTokens;

impl IdentityResolver for TestTokens {
  fn resolve(&self, token: &str) -> Option<Caller> {
    let (role, id) = token.split_once('-')?;
    let user_id = id.parse().ok()?;
    let role = match role {
      "admin" => Role::Admin,
      "patient" => Role::Patient,
      _ => return None,
    };
    Some(Caller { user_id, role })
  }
}

async fn app() -> (Router, Arc<SqliteStore>) {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let state = AppState {
    store:    Arc::clone(&store),
    identity: Arc::new(TestTokens),
  };
  (router(state), store)
}

/// Seed one admin and one patient; returns `(admin_id, patient_id)`.
async fn seed(store: &SqliteStore) -> (i64, i64) {
  let admin = store.create_user("carer".into(), Role::Admin).await.unwrap();
  let patient = store
    .create_user("alice".into(), Role::Patient)
    .await
    .unwrap();
  (admin.user_id, patient.user_id)
}

fn get(path: &str, token: &str) -> Request<Body> {
  Request::builder()
    .uri(path)
    .header(header::AUTHORIZATION, format!("Bearer {token}"))
    .body(Body::empty())
    .unwrap()
}

fn post(path: &str, token: &str, body: Value) -> Request<Body> {
  Request::builder()
    .method("POST")
    .uri(path)
    .header(header::AUTHORIZATION, format!("Bearer {token}"))
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(body.to_string()))
    .unwrap()
}

fn put(path: &str, token: &str, body: Value) -> Request<Body> {
  Request::builder()
    .method("PUT")
    .uri(path)
    .header(header::AUTHORIZATION, format!("Bearer {token}"))
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(body.to_string()))
    .unwrap()
}

/// Registration is the one unauthenticated route.
fn post_open(path: &str, body: Value) -> Request<Body> {
  Request::builder()
    .method("POST")
    .uri(path)
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(body.to_string()))
    .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
  let response = app.clone().oneshot(req).await.unwrap();
  let status = response.status();
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

// ─── Auth ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_token_is_unauthorized() {
  let (app, _) = app().await;
  let req = Request::builder()
    .uri("/invitations")
    .body(Body::empty())
    .unwrap();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
  let (app, _) = app().await;
  let (status, _) = send(&app, get("/invitations", "bogus")).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ─── Registration ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_user_and_reject_duplicates() {
  let (app, _) = app().await;

  let body = json!({ "username": "carer", "role": "admin" });
  let (status, user) = send(&app, post_open("/users", body.clone())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(user["username"], "carer");
  assert_eq!(user["role"], "admin");

  let (status, err) = send(&app, post_open("/users", body)).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(err["error"].as_str().unwrap().contains("username"));
}

#[tokio::test]
async fn register_rejects_blank_username() {
  let (app, _) = app().await;
  let body = json!({ "username": "   ", "role": "patient" });
  let (status, _) = send(&app, post_open("/users", body)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Invitation flow ──────────────────────────────────────────────────────────

#[tokio::test]
async fn full_invitation_flow() {
  let (app, store) = app().await;
  let (admin_id, patient_id) = seed(&store).await;
  let admin_token = format!("admin-{admin_id}");
  let patient_token = format!("patient-{patient_id}");

  // Admin invites the patient.
  let body = json!({ "admin_id": admin_id, "patient_id": patient_id });
  let (status, created) =
    send(&app, post("/create-invitation", &admin_token, body.clone())).await;
  assert_eq!(status, StatusCode::OK);
  let invitation_id = created["invitation_id"].as_i64().unwrap();

  // A duplicate while pending conflicts.
  let (status, err) =
    send(&app, post("/create-invitation", &admin_token, body.clone())).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(err["error"].as_str().unwrap().contains("pending"));

  // The patient sees it in their inbox.
  let (status, inbox) = send(&app, get("/invitations", &patient_token)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(inbox["invitations"].as_array().unwrap().len(), 1);
  assert_eq!(inbox["invitations"][0]["status"], "pending");

  // The patient accepts.
  let respond = json!({ "invitation_id": invitation_id, "response": "accept" });
  let (status, _) =
    send(&app, post("/respond-invitation", &patient_token, respond)).await;
  assert_eq!(status, StatusCode::OK);

  // The household view now lists the patient.
  let (status, view) =
    send(&app, get("/household/patients", &admin_token)).await;
  assert_eq!(status, StatusCode::OK);
  let patients = view["patients"].as_array().unwrap();
  assert_eq!(patients.len(), 1);
  assert_eq!(patients[0]["patient_id"].as_i64().unwrap(), patient_id);

  // Re-inviting a member conflicts with a specific message.
  let (status, err) = send(&app, post("/create-invitation", &admin_token, body)).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(err["error"].as_str().unwrap().contains("already in the household"));
}

#[tokio::test]
async fn create_invitation_requires_matching_admin() {
  let (app, store) = app().await;
  let (admin_id, patient_id) = seed(&store).await;

  // A patient token cannot create invitations.
  let body = json!({ "admin_id": admin_id, "patient_id": patient_id });
  let (status, _) = send(
    &app,
    post("/create-invitation", &format!("patient-{patient_id}"), body),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  // An admin cannot create invitations on another admin's behalf.
  let body = json!({ "admin_id": admin_id + 100, "patient_id": patient_id });
  let (status, _) = send(
    &app,
    post("/create-invitation", &format!("admin-{admin_id}"), body),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn inviting_unknown_patient_is_not_found() {
  let (app, store) = app().await;
  let (admin_id, _) = seed(&store).await;

  let body = json!({ "admin_id": admin_id, "patient_id": 999 });
  let (status, _) = send(
    &app,
    post("/create-invitation", &format!("admin-{admin_id}"), body),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responding_to_someone_elses_invitation_is_forbidden() {
  let (app, store) = app().await;
  let (admin_id, patient_id) = seed(&store).await;
  let other = store
    .create_user("mallory".into(), Role::Patient)
    .await
    .unwrap();

  let invitation = store
    .create_invitation(admin_id, patient_id)
    .await
    .unwrap();

  let body = json!({
    "invitation_id": invitation.invitation_id,
    "response": "accept",
  });
  let (status, _) = send(
    &app,
    post(
      "/respond-invitation",
      &format!("patient-{}", other.user_id),
      body,
    ),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn resolved_invitation_conflicts_on_second_response() {
  let (app, store) = app().await;
  let (admin_id, patient_id) = seed(&store).await;
  let token = format!("patient-{patient_id}");

  let invitation = store
    .create_invitation(admin_id, patient_id)
    .await
    .unwrap();

  let reject = json!({
    "invitation_id": invitation.invitation_id,
    "response": "reject",
  });
  let (status, _) = send(&app, post("/respond-invitation", &token, reject)).await;
  assert_eq!(status, StatusCode::OK);

  let accept = json!({
    "invitation_id": invitation.invitation_id,
    "response": "accept",
  });
  let (status, _) = send(&app, post("/respond-invitation", &token, accept)).await;
  assert_eq!(status, StatusCode::CONFLICT);
}

// ─── Status board ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn status_board_reflects_outcomes() {
  let (app, store) = app().await;
  let (admin_id, patient_id) = seed(&store).await;
  let token = format!("admin-{admin_id}");

  let invitation = store
    .create_invitation(admin_id, patient_id)
    .await
    .unwrap();
  store
    .respond(
      invitation.invitation_id,
      patient_id,
      hearth_core::invitation::Decision::Reject,
    )
    .await
    .unwrap();

  let (status, board) =
    send(&app, get("/household/patient-statuses", &token)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(board["pending"].as_array().unwrap().len(), 0);
  assert_eq!(board["approved"].as_array().unwrap().len(), 0);
  let canceled = board["canceled"].as_array().unwrap();
  assert_eq!(canceled.len(), 1);
  assert_eq!(canceled[0]["status"], "canceled");
}

#[tokio::test]
async fn household_routes_require_admin() {
  let (app, store) = app().await;
  let (_, patient_id) = seed(&store).await;
  let token = format!("patient-{patient_id}");

  let (status, _) = send(&app, get("/household/patients", &token)).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = send(&app, get("/household/patient-statuses", &token)).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

// ─── Guarded patient records ──────────────────────────────────────────────────

#[tokio::test]
async fn record_access_follows_membership() {
  let (app, store) = app().await;
  let (admin_id, patient_id) = seed(&store).await;
  let admin_token = format!("admin-{admin_id}");
  let path = format!("/patients/{patient_id}");

  // Not yet a member: the admin is refused.
  let (status, _) = send(&app, get(&path, &admin_token)).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  // The patient always reaches their own record.
  let (status, profile) =
    send(&app, get(&path, &format!("patient-{patient_id}"))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(profile["patient_id"].as_i64().unwrap(), patient_id);

  // Another patient is refused.
  let other = store
    .create_user("mallory".into(), Role::Patient)
    .await
    .unwrap();
  let (status, _) =
    send(&app, get(&path, &format!("patient-{}", other.user_id))).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  // After accept, the admin reaches the record.
  let invitation = store
    .create_invitation(admin_id, patient_id)
    .await
    .unwrap();
  store
    .respond(
      invitation.invitation_id,
      patient_id,
      hearth_core::invitation::Decision::Accept,
    )
    .await
    .unwrap();

  let (status, _) = send(&app, get(&path, &admin_token)).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn member_admin_can_update_record() {
  let (app, store) = app().await;
  let (admin_id, patient_id) = seed(&store).await;

  let invitation = store
    .create_invitation(admin_id, patient_id)
    .await
    .unwrap();
  store
    .respond(
      invitation.invitation_id,
      patient_id,
      hearth_core::invitation::Decision::Accept,
    )
    .await
    .unwrap();

  let patch = json!({ "name": "Alice", "blood_type": "AB-" });
  let (status, profile) = send(
    &app,
    put(
      &format!("/patients/{patient_id}"),
      &format!("admin-{admin_id}"),
      patch,
    ),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(profile["name"], "Alice");
  assert_eq!(profile["blood_type"], "AB-");
}
