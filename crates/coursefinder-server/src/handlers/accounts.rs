//! Account endpoints: registration, login, token issuance, verification
//! codes, and profile updates.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use chrono::{Duration, Utc};
use coursefinder_core::{
  Error,
  profile::{
    CollegeFields, CollegeProfile, CollegeUpdate, NewCollege, NewStudent,
    StudentFields, StudentProfile, StudentUpdate,
  },
  store::AdmissionsStore,
  user::NewUser,
};
use rand_core::{OsRng, RngCore as _};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  AppState,
  auth::{self, AuthAccount, TokenKind},
  error::{ApiError, ApiResult},
};

// ─── CSRF shim ───────────────────────────────────────────────────────────────

/// Compatibility endpoint for clients that fetch a CSRF token before
/// posting forms. Auth here is bearer-token based, so the value is opaque
/// and never checked.
pub async fn csrf() -> Json<Value> {
  Json(json!({ "csrfToken": Uuid::new_v4().simple().to_string() }))
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TokenRequest {
  /// Username, or email when it contains `@`.
  pub username: String,
  pub password: String,
}

pub async fn token_obtain<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  Json(body): Json<TokenRequest>,
) -> ApiResult<Json<Value>> {
  let user = state
    .store
    .find_user_by_identifier(&body.username)
    .await?
    .filter(|u| auth::verify_password(&body.password, &u.password_hash))
    .ok_or_else(|| ApiError::bad_request("Invalid credentials"))?;
  if !user.is_active {
    return Err(ApiError::bad_request("User account is disabled"));
  }

  let pair = state.tokens.issue_pair(user.id, user.role)?;
  Ok(Json(json!({ "access": pair.access, "refresh": pair.refresh })))
}

#[derive(Deserialize)]
pub struct RefreshRequest {
  pub refresh: String,
}

pub async fn token_refresh<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  Json(body): Json<RefreshRequest>,
) -> ApiResult<Json<Value>> {
  let claims = state.tokens.verify(&body.refresh, TokenKind::Refresh)?;
  let account = state
    .store
    .get_account(claims.sub)
    .await?
    .ok_or_else(ApiError::unauthorized)?;
  if !account.user.is_active {
    return Err(ApiError::forbidden("User account is disabled"));
  }

  let access =
    state
      .tokens
      .issue(account.user.id, account.user.role, TokenKind::Access)?;
  Ok(Json(json!({ "access": access })))
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
  pub email:    String,
  pub password: String,
}

pub async fn login<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
  if body.email.is_empty() || body.password.is_empty() {
    return Err(ApiError::bad_request("Email and password are required"));
  }

  let Some(user) = state.store.find_user_by_identifier(&body.email).await? else {
    return Err(ApiError::bad_request("Invalid email"));
  };
  if !auth::verify_password(&body.password, &user.password_hash) {
    return Err(ApiError::bad_request("Invalid password"));
  }
  if !user.is_active {
    return Err(ApiError::bad_request("User account is disabled"));
  }

  let account = state
    .store
    .get_account(user.id)
    .await?
    .ok_or_else(|| ApiError::internal("account missing for known user"))?;
  if let Some(student) = account.student()
    && !student.verified
  {
    return Err(ApiError::forbidden(
      "Email not verified. Please verify your email before logging in.",
    ));
  }

  state.store.record_login(user.id).await?;
  let pair = state.tokens.issue_pair(user.id, user.role)?;

  Ok(Json(json!({
    "id":            user.id,
    "username":      user.username,
    "email":         user.email,
    "role":          user.role,
    "access_token":  pair.access,
    "refresh_token": pair.refresh,
    "message":       "Login successful",
  })))
}

// ─── Verification codes ──────────────────────────────────────────────────────

const OTP_TTL_MINUTES: i64 = 10;

#[derive(Deserialize)]
pub struct OtpRequest {
  #[serde(default)]
  pub email: String,
}

/// Issue a registration verification code. The code is stored server-side
/// and travels only by mail; the response never echoes it.
pub async fn send_otp<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  Json(body): Json<OtpRequest>,
) -> ApiResult<Json<Value>> {
  let email = body.email.trim();
  if email.is_empty() {
    return Err(ApiError::bad_request("Email is required."));
  }
  if state.store.find_user_by_identifier(email).await?.is_some() {
    return Err(Error::EmailTaken(email.to_owned()).into());
  }

  let code = generate_code();
  let expires_at = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);
  state.store.store_otp(email, &code, expires_at).await?;

  state
    .mailer
    .send(
      email,
      "CourseFinder verification",
      &format!(
        "Here is your OTP for registration: {code}. It is valid for {OTP_TTL_MINUTES} minutes."
      ),
    )
    .map_err(|e| {
      tracing::error!("verification mail failed: {e}");
      ApiError::internal("failed to send verification mail")
    })?;

  Ok(Json(json!({
    "message": "OTP sent successfully.",
    "expiry":  expires_at,
  })))
}

fn generate_code() -> String {
  let n = OsRng.next_u32() % 900_000 + 100_000;
  n.to_string()
}

// ─── Registration ────────────────────────────────────────────────────────────

fn check_credentials(username: &str, email: &str, password: &str) -> ApiResult<()> {
  if username.trim().is_empty() {
    return Err(ApiError::bad_request("username must not be empty"));
  }
  if email.trim().is_empty() || !email.contains('@') {
    return Err(ApiError::bad_request("a valid email is required"));
  }
  if password.is_empty() {
    return Err(ApiError::bad_request("password must not be empty"));
  }
  Ok(())
}

#[derive(Deserialize)]
pub struct AdminRegisterRequest {
  pub username: String,
  pub email:    String,
  pub password: String,
}

pub async fn register_admin<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  Json(body): Json<AdminRegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
  check_credentials(&body.username, &body.email, &body.password)?;
  let password_hash = auth::hash_password(&body.password)?;

  let account = state
    .store
    .create_admin(NewUser {
      username: body.username,
      email: body.email,
      password_hash,
    })
    .await?;
  let pair = state.tokens.issue_pair(account.user.id, account.user.role)?;

  Ok((
    StatusCode::CREATED,
    Json(json!({
      "id":            account.user.id,
      "username":      account.user.username,
      "email":         account.user.email,
      "role":          account.user.role,
      "access_token":  pair.access,
      "refresh_token": pair.refresh,
      "message":       "Registration successful",
    })),
  ))
}

#[derive(Deserialize)]
pub struct StudentRegisterRequest {
  pub username: String,
  pub email:    String,
  pub password: String,
  /// Verification code previously delivered via `/sendotp/`.
  pub otp:      String,
  #[serde(flatten)]
  pub fields:   StudentFields,
}

pub async fn register_student<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  Json(body): Json<StudentRegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
  check_credentials(&body.username, &body.email, &body.password)?;
  body.fields.validate()?;

  if !state
    .store
    .consume_otp(&body.email, &body.otp, Utc::now())
    .await?
  {
    return Err(ApiError::bad_request("Invalid or expired OTP."));
  }

  let password_hash = auth::hash_password(&body.password)?;
  let account = state
    .store
    .create_student(NewStudent {
      user:   NewUser {
        username: body.username,
        email: body.email,
        password_hash,
      },
      fields: body.fields,
    })
    .await?;
  let pair = state.tokens.issue_pair(account.user.id, account.user.role)?;

  Ok((
    StatusCode::CREATED,
    Json(json!({
      "id":            account.user.id,
      "username":      account.user.username,
      "email":         account.user.email,
      "role":          account.user.role,
      "access_token":  pair.access,
      "refresh_token": pair.refresh,
      "message":       "Student registration successful",
    })),
  ))
}

#[derive(Deserialize)]
pub struct CollegeRegisterRequest {
  pub username: String,
  pub email:    String,
  pub password: String,
  #[serde(flatten)]
  pub fields:   CollegeFields,
}

pub async fn register_college<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  Json(body): Json<CollegeRegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
  check_credentials(&body.username, &body.email, &body.password)?;
  body.fields.validate()?;

  let password_hash = auth::hash_password(&body.password)?;
  let account = state
    .store
    .create_college(NewCollege {
      user:   NewUser {
        username: body.username,
        email: body.email,
        password_hash,
      },
      fields: body.fields,
    })
    .await?;
  let pair = state.tokens.issue_pair(account.user.id, account.user.role)?;
  let name = account
    .college()
    .map(|c| c.fields.name.clone())
    .unwrap_or_default();

  Ok((
    StatusCode::CREATED,
    Json(json!({
      "id":            account.user.id,
      "name":          name,
      "email":         account.user.email,
      "role":          account.user.role,
      "access_token":  pair.access,
      "refresh_token": pair.refresh,
      "message":       "College registered successfully",
    })),
  ))
}

// ─── Profile updates ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StudentProfileResponse {
  pub username: String,
  pub email:    String,
  #[serde(flatten)]
  pub profile:  StudentProfile,
}

/// The authenticated student's own profile.
pub async fn student_profile<S: AdmissionsStore + 'static>(
  State(_state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
) -> ApiResult<Json<StudentProfileResponse>> {
  let profile = account.student().cloned().ok_or_else(|| {
    ApiError::forbidden("You are not associated with any student profile")
  })?;
  Ok(Json(StudentProfileResponse {
    username: account.user.username,
    email: account.user.email,
    profile,
  }))
}

#[derive(Deserialize, Default)]
pub struct StudentUpdateRequest {
  pub username: Option<String>,
  pub email:    Option<String>,
  pub password: Option<String>,
  #[serde(flatten)]
  pub fields:   StudentFields,
}

pub async fn update_student<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
  Json(body): Json<StudentUpdateRequest>,
) -> ApiResult<Json<StudentProfile>> {
  if account.student().is_none() {
    return Err(ApiError::forbidden(
      "Only students can update a student profile",
    ));
  }
  body.fields.validate()?;

  let password_hash = body.password.as_deref().map(auth::hash_password).transpose()?;
  let update = StudentUpdate {
    username: body.username,
    email: body.email,
    password_hash,
    phone_number: body.fields.phone_number,
    date_of_birth: body.fields.date_of_birth,
    gender: body.fields.gender,
    school_name: body.fields.school_name,
    highest_qualification: body.fields.highest_qualification,
    marks_percentage: body.fields.marks_percentage,
    passing_year: body.fields.passing_year,
    street: body.fields.street,
    district: body.fields.district,
    state: body.fields.state,
  };

  let profile = state.store.update_student(account.user.id, update).await?;
  Ok(Json(profile))
}

#[derive(Serialize)]
pub struct CollegeProfileResponse {
  pub username: String,
  pub email:    String,
  #[serde(flatten)]
  pub profile:  CollegeProfile,
}

/// The authenticated college's own profile.
pub async fn college_profile<S: AdmissionsStore + 'static>(
  State(_state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
) -> ApiResult<Json<CollegeProfileResponse>> {
  let profile = account.college().cloned().ok_or_else(|| {
    ApiError::forbidden("You are not associated with any college")
  })?;
  Ok(Json(CollegeProfileResponse {
    username: account.user.username,
    email: account.user.email,
    profile,
  }))
}

#[derive(Deserialize, Default)]
pub struct CollegeUpdateRequest {
  pub password:    Option<String>,
  pub name:        Option<String>,
  pub logo:        Option<String>,
  pub image:       Option<String>,
  pub street:      Option<String>,
  pub state:       Option<String>,
  pub district:    Option<String>,
  pub description: Option<String>,
}

pub async fn update_college<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
  Path(college_id): Path<i64>,
  Json(body): Json<CollegeUpdateRequest>,
) -> ApiResult<Json<CollegeProfile>> {
  if !account.college().is_some_and(|c| c.id == college_id) {
    return Err(ApiError::forbidden("Permission denied"));
  }
  apply_college_update(&state, college_id, body).await
}

/// Update the authenticated college's own profile, no path id needed.
pub async fn update_own_college<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
  Json(body): Json<CollegeUpdateRequest>,
) -> ApiResult<Json<CollegeProfile>> {
  let college_id = account.college().map(|c| c.id).ok_or_else(|| {
    ApiError::forbidden("You are not associated with any college")
  })?;
  apply_college_update(&state, college_id, body).await
}

async fn apply_college_update<S: AdmissionsStore>(
  state: &AppState<S>,
  college_id: i64,
  body: CollegeUpdateRequest,
) -> ApiResult<Json<CollegeProfile>> {
  if let Some(name) = &body.name
    && name.trim().is_empty()
  {
    return Err(ApiError::bad_request("college name must not be empty"));
  }

  let password_hash = body.password.as_deref().map(auth::hash_password).transpose()?;
  let update = CollegeUpdate {
    password_hash,
    name: body.name,
    logo: body.logo,
    image: body.image,
    street: body.street,
    state: body.state,
    district: body.district,
    description: body.description,
  };

  let profile = state
    .store
    .update_college_profile(college_id, update)
    .await?;
  Ok(Json(profile))
}
