//! Application endpoints: applying, listing, and the status workflow.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use coursefinder_core::{
  application::{
    Application, ApplicationStatus, CollegeApplication, NewApplication,
    StudentApplication,
  },
  store::AdmissionsStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState,
  auth::AuthAccount,
  error::{ApiError, ApiResult},
};

#[derive(Deserialize)]
pub struct ApplyRequest {
  pub college_id: i64,
  pub course_id:  i64,
  #[serde(default)]
  pub payment_id: String,
}

pub async fn apply<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
  Json(body): Json<ApplyRequest>,
) -> ApiResult<(StatusCode, Json<Application>)> {
  let student = account
    .student()
    .ok_or_else(|| ApiError::forbidden("Only students can apply to colleges."))?;

  let input = NewApplication {
    student_id: student.id,
    college_id: body.college_id,
    course_id:  body.course_id,
    payment_id: body.payment_id,
  };
  input.validate()?;

  let application = state.store.create_application(input).await?;
  Ok((StatusCode::CREATED, Json(application)))
}

/// Applications the authenticated student has submitted; empty for other
/// roles.
pub async fn applied_colleges<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
) -> ApiResult<Json<Vec<StudentApplication>>> {
  let Some(student) = account.student() else {
    return Ok(Json(Vec::new()));
  };
  Ok(Json(state.store.list_student_applications(student.id).await?))
}

pub async fn college_applications<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
) -> ApiResult<Json<Vec<CollegeApplication>>> {
  let college = account.college().ok_or_else(|| {
    ApiError::forbidden("You are not associated with any college")
  })?;
  Ok(Json(state.store.list_college_applications(college.id).await?))
}

#[derive(Deserialize, Default)]
pub struct StatusRequest {
  #[serde(default)]
  pub status: String,
}

pub async fn update_status<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
  Path(application_id): Path<i64>,
  Json(body): Json<StatusRequest>,
) -> ApiResult<Json<Value>> {
  let college = account.college().ok_or_else(|| {
    ApiError::forbidden("You are not associated with any college")
  })?;

  // Parsed by hand so unknown values get the domain message rather than a
  // deserialisation error.
  let next = match body.status.as_str() {
    "approved" => ApplicationStatus::Approved,
    "rejected" => ApplicationStatus::Rejected,
    _ => return Err(ApiError::bad_request("Invalid status")),
  };

  state
    .store
    .set_application_status(application_id, college.id, next)
    .await?;
  Ok(Json(json!({
    "message": format!("Application status updated to {next}")
  })))
}
