//! CourseFinder HTTP API.
//!
//! Exposes an axum [`Router`] over any
//! [`AdmissionsStore`](coursefinder_core::store::AdmissionsStore) backend:
//! registration and JWT auth for students, colleges, and admins, a public
//! catalog, the application workflow, reviews, a contact log, and a chatbot
//! relay.

pub mod auth;
pub mod chat;
pub mod error;
pub mod handlers;
pub mod mailer;

pub use error::{ApiError, ApiResult};

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, patch, post, put},
};
use coursefinder_core::store::AdmissionsStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::TokenIssuer;
use chat::ChatRelay;
use handlers::{
  accounts, admin, applications, catalog, chatbot, contact, reviews,
};
use mailer::Mailer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  pub db_path:      PathBuf,
  /// HS256 signing secret for access and refresh tokens.
  pub jwt_secret:   String,
  #[serde(default = "default_chat_api_url")]
  pub chat_api_url: String,
  /// Leave empty to disable the upstream chat relay.
  #[serde(default)]
  pub chat_api_key: String,
  #[serde(default = "default_chat_model")]
  pub chat_model:   String,
}

fn default_chat_api_url() -> String {
  "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_chat_model() -> String {
  "llama3-70b-8192".to_string()
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S: AdmissionsStore> {
  pub store:  Arc<S>,
  pub tokens: Arc<TokenIssuer>,
  pub mailer: Arc<dyn Mailer>,
  pub chat:   Arc<dyn ChatRelay>,
}

impl<S: AdmissionsStore> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      tokens: Arc::clone(&self.tokens),
      mailer: Arc::clone(&self.mailer),
      chat:   Arc::clone(&self.chat),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full CourseFinder [`Router`].
pub fn router<S>(state: AppState<S>) -> Router
where
  S: AdmissionsStore + 'static,
{
  Router::new()
    .route("/csrf/",            get(accounts::csrf))
    .route("/token/",           post(accounts::token_obtain::<S>))
    .route("/token/refresh/",   post(accounts::token_refresh::<S>))
    .route("/login/",           post(accounts::login::<S>))
    .route("/sendotp/",         post(accounts::send_otp::<S>))
    .route("/adminregister/",   post(accounts::register_admin::<S>))
    .route("/studentregister/", post(accounts::register_student::<S>))
    .route("/collegeregister/", post(accounts::register_college::<S>))
    .route("/colleges/",        get(catalog::list_colleges::<S>))
    .route("/college/{pk}/",    get(catalog::get_college::<S>))
    .route("/addcourse/",       post(catalog::add_courses::<S>))
    .route("/filterdata/",      get(catalog::filter_data::<S>))
    .route("/apply/",           post(applications::apply::<S>))
    .route("/applied-colleges/", get(applications::applied_colleges::<S>))
    .route(
      "/colleges/{college_id}/reviews/",
      get(reviews::college_reviews::<S>).post(reviews::create_review::<S>),
    )
    .route(
      "/student/update/",
      get(accounts::student_profile::<S>).put(accounts::update_student::<S>),
    )
    .route("/college/update/{pk}/", put(accounts::update_college::<S>))
    .route(
      "/college/applications/",
      get(applications::college_applications::<S>),
    )
    .route(
      "/college/application/{application_id}/update/",
      post(applications::update_status::<S>),
    )
    .route(
      "/college/profile/",
      get(accounts::college_profile::<S>)
        .put(accounts::update_own_college::<S>),
    )
    .route(
      "/college/approve/{college_id}/",
      patch(admin::approve_college::<S>),
    )
    .route(
      "/college/delete/{college_id}/",
      delete(admin::delete_college::<S>),
    )
    .route(
      "/courses/",
      get(catalog::list_my_courses::<S>).post(catalog::create_course::<S>),
    )
    .route(
      "/courses/{pk}/",
      put(catalog::update_course::<S>).delete(catalog::delete_course::<S>),
    )
    .route("/chatbot/",         post(chatbot::chatbot::<S>))
    .route("/all-users/",       get(admin::all_users::<S>))
    .route("/all-reviews/",     get(reviews::all_reviews::<S>))
    .route(
      "/contact/message/",
      get(contact::list_messages::<S>).post(contact::create_message::<S>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
  };

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use coursefinder_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use crate::{
    chat::{ChatError, ChatRelay},
    mailer::{MailError, Mailer},
  };

  // ── Test doubles ────────────────────────────────────────────────────────

  /// Captures outbound mail so tests can read verification codes.
  struct RecordingMailer(Mutex<Vec<(String, String, String)>>);

  impl RecordingMailer {
    fn new() -> Self {
      Self(Mutex::new(Vec::new()))
    }

    fn last_body(&self) -> String {
      self.0.lock().unwrap().last().unwrap().2.clone()
    }
  }

  impl Mailer for RecordingMailer {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
      self
        .0
        .lock()
        .unwrap()
        .push((to.to_owned(), subject.to_owned(), body.to_owned()));
      Ok(())
    }
  }

  /// Relay that always answers with a fixed string.
  struct CannedRelay(&'static str);

  impl ChatRelay for CannedRelay {
    fn reply<'a>(
      &'a self,
      _message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ChatError>> + Send + 'a>>
    {
      Box::pin(async move { Ok(crate::chat::format_emphasis(self.0)) })
    }
  }

  // ── Harness ─────────────────────────────────────────────────────────────

  async fn make_state() -> (AppState<SqliteStore>, Arc<RecordingMailer>) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let mailer = Arc::new(RecordingMailer::new());
    let state = AppState {
      store:  Arc::new(store),
      tokens: Arc::new(TokenIssuer::new("test-secret")),
      mailer: mailer.clone(),
      chat:   Arc::new(CannedRelay("Tuition there is *very affordable*.")),
    };
    (state, mailer)
  }

  async fn send(
    state: &AppState<SqliteStore>,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp = router(state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  fn extract_code(mail_body: &str) -> String {
    mail_body
      .split("registration: ")
      .nth(1)
      .unwrap()
      .chars()
      .take_while(|c| c.is_ascii_digit())
      .collect()
  }

  /// Full student sign-up via the OTP mail flow; returns an access token.
  async fn register_student(
    state: &AppState<SqliteStore>,
    mailer: &RecordingMailer,
    username: &str,
  ) -> String {
    let email = format!("{username}@example.com");
    let (status, body) =
      send(state, "POST", "/sendotp/", None, Some(json!({ "email": email })))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let code = extract_code(&mailer.last_body());
    let (status, body) = send(
      state,
      "POST",
      "/studentregister/",
      None,
      Some(json!({
        "username": username,
        "email":    email,
        "password": "pw",
        "otp":      code,
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["access_token"].as_str().unwrap().to_owned()
  }

  /// Registers a college; returns (access token, college profile id).
  async fn register_college(
    state: &AppState<SqliteStore>,
    username: &str,
  ) -> (String, i64) {
    let (status, body) = send(
      state,
      "POST",
      "/collegeregister/",
      None,
      Some(json!({
        "username": username,
        "email":    format!("{username}@example.com"),
        "password": "pw",
        "name":     username,
        "state":    "Kerala",
        "district": "Ernakulam",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let token = body["access_token"].as_str().unwrap().to_owned();

    let (status, profile) =
      send(state, "GET", "/college/profile/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{profile}");
    (token, profile["id"].as_i64().unwrap())
  }

  async fn register_admin(state: &AppState<SqliteStore>) -> String {
    let (status, body) = send(
      state,
      "POST",
      "/adminregister/",
      None,
      Some(json!({
        "username": "root",
        "email":    "root@example.com",
        "password": "pw",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["access_token"].as_str().unwrap().to_owned()
  }

  /// Adds one course for the college token; returns its id.
  async fn add_course(
    state: &AppState<SqliteStore>,
    token: &str,
    name: &str,
  ) -> i64 {
    let (status, body) = send(
      state,
      "POST",
      "/courses/",
      Some(token),
      Some(json!({ "name": name, "duration": 3, "fee": 42000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
  }

  // ── Registration and login ──────────────────────────────────────────────

  #[tokio::test]
  async fn student_registration_and_login_flow() {
    let (state, mailer) = make_state().await;
    register_student(&state, &mailer, "asha").await;

    let (status, body) = send(
      &state,
      "POST",
      "/login/",
      None,
      Some(json!({ "email": "asha@example.com", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["role"], "student");
    assert_eq!(body["message"], "Login successful");
    assert!(body["access_token"].as_str().is_some());
  }

  #[tokio::test]
  async fn otp_response_never_contains_the_code() {
    let (state, mailer) = make_state().await;
    let (status, body) = send(
      &state,
      "POST",
      "/sendotp/",
      None,
      Some(json!({ "email": "new@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "OTP sent successfully.");
    assert!(body["expiry"].as_str().is_some());
    assert!(body.get("otp").is_none());
    assert!(body.get("code").is_none());

    // The code only travels by mail.
    let code = extract_code(&mailer.last_body());
    assert_eq!(code.len(), 6);
  }

  #[tokio::test]
  async fn registration_rejects_wrong_or_stale_otp() {
    let (state, mailer) = make_state().await;
    let (_, _) = send(
      &state,
      "POST",
      "/sendotp/",
      None,
      Some(json!({ "email": "asha@example.com" })),
    )
    .await;
    let code = extract_code(&mailer.last_body());

    let wrong = json!({
      "username": "asha",
      "email":    "asha@example.com",
      "password": "pw",
      "otp":      "000000",
    });
    let (status, body) =
      send(&state, "POST", "/studentregister/", None, Some(wrong)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired OTP.");

    // The right code still works once...
    let right = json!({
      "username": "asha",
      "email":    "asha@example.com",
      "password": "pw",
      "otp":      code,
    });
    let (status, _) =
      send(&state, "POST", "/studentregister/", None, Some(right.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // ...and is consumed afterwards.
    let (status, body) =
      send(&state, "POST", "/studentregister/", None, Some(right)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
  }

  #[tokio::test]
  async fn sendotp_rejects_registered_email() {
    let (state, mailer) = make_state().await;
    register_student(&state, &mailer, "asha").await;

    let (status, body) = send(
      &state,
      "POST",
      "/sendotp/",
      None,
      Some(json!({ "email": "asha@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already registered"));
  }

  #[tokio::test]
  async fn login_distinguishes_unknown_email_and_wrong_password() {
    let (state, mailer) = make_state().await;
    register_student(&state, &mailer, "asha").await;

    let (status, body) = send(
      &state,
      "POST",
      "/login/",
      None,
      Some(json!({ "email": "ghost@example.com", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid email");

    let (status, body) = send(
      &state,
      "POST",
      "/login/",
      None,
      Some(json!({ "email": "asha@example.com", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid password");
  }

  #[tokio::test]
  async fn token_endpoints_issue_and_refresh() {
    let (state, mailer) = make_state().await;
    register_student(&state, &mailer, "asha").await;

    // By username and by email.
    for identifier in ["asha", "asha@example.com"] {
      let (status, body) = send(
        &state,
        "POST",
        "/token/",
        None,
        Some(json!({ "username": identifier, "password": "pw" })),
      )
      .await;
      assert_eq!(status, StatusCode::OK, "{body}");
      assert!(body["access"].as_str().is_some());

      let refresh = body["refresh"].as_str().unwrap().to_owned();
      let (status, body) = send(
        &state,
        "POST",
        "/token/refresh/",
        None,
        Some(json!({ "refresh": refresh })),
      )
      .await;
      assert_eq!(status, StatusCode::OK, "{body}");
      assert!(body["access"].as_str().is_some());

      // An access token is not accepted where a refresh token is expected.
      let access = body["access"].as_str().unwrap().to_owned();
      let (status, _) = send(
        &state,
        "POST",
        "/token/refresh/",
        None,
        Some(json!({ "refresh": access })),
      )
      .await;
      assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
  }

  #[tokio::test]
  async fn protected_routes_require_a_bearer_token() {
    let (state, _) = make_state().await;
    let (status, _) = send(&state, "GET", "/applied-colleges/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
      .method("GET")
      .uri("/applied-colleges/")
      .body(Body::empty())
      .unwrap();
    let resp = router(state.clone()).oneshot(req).await.unwrap();
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  // ── Catalog ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn public_catalog_lists_colleges_and_filters() {
    let (state, _) = make_state().await;
    let (token, college_id) = register_college(&state, "hillside").await;

    let (status, body) = send(
      &state,
      "POST",
      "/addcourse/",
      Some(&token),
      Some(json!([
        { "name": "Physics", "duration": 3, "fee": 42000 },
        { "name": "History", "duration": 3, "fee": 35000 },
      ])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Courses added successfully");

    // No auth needed for browsing.
    let (status, body) = send(&state, "GET", "/colleges/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["courses"].as_array().unwrap().len(), 2);

    // Browsing is read-only: fetching again returns the identical body.
    let (_, again) = send(&state, "GET", "/colleges/", None, None).await;
    assert_eq!(again, body);

    let (status, body) =
      send(&state, "GET", &format!("/college/{college_id}/"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "hillside");

    let (status, body) = send(&state, "GET", "/filterdata/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["courses"], json!(["Physics", "History"]));
    assert_eq!(
      body["locations"],
      json!([{ "state": "Kerala", "district": "Ernakulam" }])
    );

    let (status, body) = send(&state, "GET", "/college/999/", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
  }

  #[tokio::test]
  async fn only_colleges_can_add_courses() {
    let (state, mailer) = make_state().await;
    let student = register_student(&state, &mailer, "asha").await;

    let (status, body) = send(
      &state,
      "POST",
      "/addcourse/",
      Some(&student),
      Some(json!([{ "name": "Physics", "duration": 3, "fee": 42000 }])),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only colleges can add courses.");
  }

  #[tokio::test]
  async fn batch_course_validation_reports_every_bad_item() {
    let (state, _) = make_state().await;
    let (college, _) = register_college(&state, "hillside").await;

    let (status, body) = send(
      &state,
      "POST",
      "/addcourse/",
      Some(&college),
      Some(json!([
        { "name": "",        "duration": 3, "fee": 42000 },
        { "name": "Physics", "duration": 3, "fee": 42000 },
        { "name": "History", "duration": 0, "fee": 35000 },
      ])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("course 1:"));
    assert!(message.contains("course 3:"));
    assert!(!message.contains("course 2:"));

    // Nothing from the failed batch was inserted.
    let (_, body) = send(&state, "GET", "/courses/", Some(&college), None).await;
    assert!(body.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn course_update_and_delete_enforce_ownership() {
    let (state, _) = make_state().await;
    let (owner, _) = register_college(&state, "hillside").await;
    let (other, _) = register_college(&state, "lakeview").await;
    let course_id = add_course(&state, &owner, "Physics").await;

    let (status, body) = send(
      &state,
      "PUT",
      &format!("/courses/{course_id}/"),
      Some(&other),
      Some(json!({ "fee": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
      body["error"],
      "You don't have permission to update this course."
    );

    let (status, body) = send(
      &state,
      "PUT",
      &format!("/courses/{course_id}/"),
      Some(&owner),
      Some(json!({ "fee": 45000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["fee"], 45000);
    assert_eq!(body["name"], "Physics");

    let (status, body) = send(
      &state,
      "DELETE",
      &format!("/courses/{course_id}/"),
      Some(&owner),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Course deleted successfully.");

    let (_, body) = send(&state, "GET", "/courses/", Some(&owner), None).await;
    assert!(body.as_array().unwrap().is_empty());
  }

  // ── Applications ────────────────────────────────────────────────────────

  async fn seed_application(
    state: &AppState<SqliteStore>,
    mailer: &RecordingMailer,
  ) -> (String, String, i64, i64) {
    let student = register_student(state, mailer, "asha").await;
    let (college, college_id) = register_college(state, "hillside").await;
    let course_id = add_course(state, &college, "Physics").await;
    (student, college, college_id, course_id)
  }

  #[tokio::test]
  async fn apply_rejects_duplicates_and_payment_reuse() {
    let (state, mailer) = make_state().await;
    let (student, college, college_id, course_id) =
      seed_application(&state, &mailer).await;

    let apply = json!({
      "college_id": college_id,
      "course_id":  course_id,
      "payment_id": "pay-1",
    });
    let (status, body) =
      send(&state, "POST", "/apply/", Some(&student), Some(apply.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "pending");

    // Same course again, fresh payment id.
    let (status, body) = send(
      &state,
      "POST",
      "/apply/",
      Some(&student),
      Some(json!({
        "college_id": college_id,
        "course_id":  course_id,
        "payment_id": "pay-2",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "you have already applied for this course");

    // Reused payment id on a different course.
    let other_course = add_course(&state, &college, "History").await;
    let (status, body) = send(
      &state,
      "POST",
      "/apply/",
      Some(&student),
      Some(json!({
        "college_id": college_id,
        "course_id":  other_course,
        "payment_id": "pay-1",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("payment id"));

    // Missing payment id.
    let (status, body) = send(
      &state,
      "POST",
      "/apply/",
      Some(&student),
      Some(json!({ "college_id": college_id, "course_id": other_course })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Payment ID is required to apply.");

    let (status, body) =
      send(&state, "GET", "/applied-colleges/", Some(&student), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["college_name"], "hillside");
  }

  #[tokio::test]
  async fn status_workflow_guards_owner_and_transitions() {
    let (state, mailer) = make_state().await;
    let (student, college, college_id, course_id) =
      seed_application(&state, &mailer).await;
    let (other, _) = register_college(&state, "lakeview").await;

    let (_, body) = send(
      &state,
      "POST",
      "/apply/",
      Some(&student),
      Some(json!({
        "college_id": college_id,
        "course_id":  course_id,
        "payment_id": "pay-1",
      })),
    )
    .await;
    let application_id = body["id"].as_i64().unwrap();

    let (status, body) =
      send(&state, "GET", "/college/applications/", Some(&college), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["student_name"], "asha");
    assert_eq!(body[0]["course_name"], "Physics");

    let update_uri = format!("/college/application/{application_id}/update/");

    // Unknown status value.
    let (status, body) = send(
      &state,
      "POST",
      &update_uri,
      Some(&college),
      Some(json!({ "status": "waitlisted" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid status");

    // Another college cannot touch it.
    let (status, _) = send(
      &state,
      "POST",
      &update_uri,
      Some(&other),
      Some(json!({ "status": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
      &state,
      "POST",
      &update_uri,
      Some(&college),
      Some(json!({ "status": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Application status updated to approved");

    // Approved is terminal.
    let (status, _) = send(
      &state,
      "POST",
      &update_uri,
      Some(&college),
      Some(json!({ "status": "rejected" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── Reviews ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn review_flow_and_guards() {
    let (state, mailer) = make_state().await;
    let student = register_student(&state, &mailer, "asha").await;
    let (_, college_id) = register_college(&state, "hillside").await;
    let reviews_uri = format!("/colleges/{college_id}/reviews/");

    let (status, body) = send(
      &state,
      "POST",
      &reviews_uri,
      Some(&student),
      Some(json!({ "rating": 6 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = send(
      &state,
      "POST",
      "/colleges/999/reviews/",
      Some(&student),
      Some(json!({ "rating": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid college ID");

    let (status, body) = send(
      &state,
      "POST",
      &reviews_uri,
      Some(&student),
      Some(json!({ "rating": 4, "review_text": "solid" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["student_name"], "asha");

    // Listing is public.
    let (status, body) = send(&state, "GET", &reviews_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&state, "GET", "/all-reviews/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["college_name"], "hillside");
  }

  // ── Moderation ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn admin_moderates_colleges() {
    let (state, mailer) = make_state().await;
    let admin = register_admin(&state).await;
    let student = register_student(&state, &mailer, "asha").await;
    let (_, college_id) = register_college(&state, "hillside").await;

    let approve_uri = format!("/college/approve/{college_id}/");
    let (status, _) =
      send(&state, "PATCH", &approve_uri, Some(&student), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) =
      send(&state, "PATCH", &approve_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "College 'hillside' has been approved.");

    let (status, body) = send(&state, "GET", "/all-users/", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["username"], "asha");

    let (status, body) = send(
      &state,
      "DELETE",
      &format!("/college/delete/{college_id}/"),
      Some(&admin),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "College 'hillside' has been deleted.");

    let (status, _) =
      send(&state, "GET", &format!("/college/{college_id}/"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Profile updates ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn student_updates_own_profile() {
    let (state, mailer) = make_state().await;
    let student = register_student(&state, &mailer, "asha").await;

    let (status, body) = send(
      &state,
      "PUT",
      "/student/update/",
      Some(&student),
      Some(json!({ "phone_number": "5550100", "school_name": "Hillside" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["phone_number"], "5550100");

    let (status, body) =
      send(&state, "GET", "/student/update/", Some(&student), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["username"], "asha");
    assert_eq!(body["school_name"], "Hillside");

    // Blank identity values are rejected, not written through.
    let (status, body) = send(
      &state,
      "PUT",
      "/student/update/",
      Some(&student),
      Some(json!({ "username": "", "email": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    let (_, body) =
      send(&state, "GET", "/student/update/", Some(&student), None).await;
    assert_eq!(body["username"], "asha");

    // Password change takes effect on the next login.
    let (status, _) = send(
      &state,
      "PUT",
      "/student/update/",
      Some(&student),
      Some(json!({ "password": "new-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
      &state,
      "POST",
      "/login/",
      None,
      Some(json!({ "email": "asha@example.com", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
      &state,
      "POST",
      "/login/",
      None,
      Some(json!({ "email": "asha@example.com", "password": "new-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn college_update_is_owner_only() {
    let (state, _) = make_state().await;
    let (owner, college_id) = register_college(&state, "hillside").await;
    let (other, _) = register_college(&state, "lakeview").await;
    let update_uri = format!("/college/update/{college_id}/");

    let (status, body) = send(
      &state,
      "PUT",
      &update_uri,
      Some(&other),
      Some(json!({ "description": "ours now" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Permission denied");

    let (status, body) = send(
      &state,
      "PUT",
      &update_uri,
      Some(&owner),
      Some(json!({ "description": "a fine college" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["description"], "a fine college");
    // Approval state is not reachable through this endpoint.
    assert_eq!(body["is_approved"], false);

    // The id-less self-update route resolves the caller's own college.
    let (status, body) = send(
      &state,
      "PUT",
      "/college/profile/",
      Some(&owner),
      Some(json!({ "street": "1 Hill Rd" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["street"], "1 Hill Rd");
    assert_eq!(body["description"], "a fine college");
  }

  // ── Contact log ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn contact_log_scopes_visibility_by_role() {
    let (state, mailer) = make_state().await;
    let admin = register_admin(&state).await;
    let student = register_student(&state, &mailer, "asha").await;

    for (token, subject) in [(&student, "fees"), (&admin, "ops")] {
      let (status, _) = send(
        &state,
        "POST",
        "/contact/message/",
        Some(token),
        Some(json!({
          "name":    "someone",
          "email":   "someone@example.com",
          "subject": subject,
          "message": "hello",
        })),
      )
      .await;
      assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) =
      send(&state, "GET", "/contact/message/", Some(&student), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["subject"], "fees");
    assert_eq!(body[0]["role"], "student");

    let (_, body) =
      send(&state, "GET", "/contact/message/", Some(&admin), None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
  }

  // ── Chatbot ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn chatbot_answers_canned_and_relayed() {
    let (state, _) = make_state().await;

    let (status, body) = send(
      &state,
      "POST",
      "/chatbot/",
      None,
      Some(json!({ "userInput": "Hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Hello! How can I assist you today?");

    let (status, body) = send(
      &state,
      "POST",
      "/chatbot/",
      None,
      Some(json!({ "userInput": "what about fees?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Tuition there is <b>very affordable</b>.");

    let (status, body) =
      send(&state, "POST", "/chatbot/", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No user input provided.");
  }

  #[tokio::test]
  async fn csrf_shim_returns_a_token() {
    let (state, _) = make_state().await;
    let (status, body) = send(&state, "GET", "/csrf/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["csrfToken"].as_str().unwrap().is_empty());
  }
}
