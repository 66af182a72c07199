//! Public catalog endpoints and college-side course management.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use coursefinder_core::{
  Error,
  catalog::{CollegeSummary, Course, CourseUpdate, FilterData, NewCourse},
  profile::Account,
  store::AdmissionsStore,
};
use serde_json::{Value, json};

use crate::{
  AppState,
  auth::AuthAccount,
  error::{ApiError, ApiResult},
};

// ─── Public browse ───────────────────────────────────────────────────────────

pub async fn list_colleges<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
) -> ApiResult<Json<Vec<CollegeSummary>>> {
  Ok(Json(state.store.list_colleges().await?))
}

pub async fn get_college<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  Path(college_id): Path<i64>,
) -> ApiResult<Json<CollegeSummary>> {
  let summary = state
    .store
    .get_college(college_id)
    .await?
    .ok_or(Error::CollegeNotFound(college_id))?;
  Ok(Json(summary))
}

pub async fn filter_data<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
) -> ApiResult<Json<FilterData>> {
  Ok(Json(state.store.filter_data().await?))
}

// ─── Course management ───────────────────────────────────────────────────────

/// Batch insert. The body is a bare JSON array of courses.
pub async fn add_courses<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
  Json(items): Json<Vec<NewCourse>>,
) -> ApiResult<(StatusCode, Json<Value>)> {
  let college = account
    .college()
    .ok_or_else(|| ApiError::forbidden("Only colleges can add courses."))?;
  if items.is_empty() {
    return Err(ApiError::bad_request("Expected a list of courses."));
  }
  // Validate the whole batch before inserting anything, reporting every
  // failing item at once.
  let errors: Vec<String> = items
    .iter()
    .enumerate()
    .filter_map(|(i, item)| {
      item.validate().err().map(|e| format!("course {}: {e}", i + 1))
    })
    .collect();
  if !errors.is_empty() {
    return Err(ApiError::bad_request(errors.join("; ")));
  }

  state.store.add_courses(college.id, items).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "Courses added successfully" })),
  ))
}

/// The authenticated college's own courses; empty for other roles.
pub async fn list_my_courses<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
) -> ApiResult<Json<Vec<Course>>> {
  let Some(college) = account.college() else {
    return Ok(Json(Vec::new()));
  };
  Ok(Json(state.store.list_courses(college.id).await?))
}

pub async fn create_course<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
  Json(item): Json<NewCourse>,
) -> ApiResult<(StatusCode, Json<Course>)> {
  let college = account
    .college()
    .ok_or_else(|| ApiError::forbidden("Only colleges can add courses."))?;
  item.validate()?;

  let mut created = state.store.add_courses(college.id, vec![item]).await?;
  let course = created
    .pop()
    .ok_or_else(|| ApiError::internal("insert returned no row"))?;
  Ok((StatusCode::CREATED, Json(course)))
}

pub async fn update_course<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
  Path(course_id): Path<i64>,
  Json(update): Json<CourseUpdate>,
) -> ApiResult<Json<Course>> {
  owned_course(&state, &account, course_id, "update").await?;
  check_update(&update)?;
  Ok(Json(state.store.update_course(course_id, update).await?))
}

pub async fn delete_course<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
  Path(course_id): Path<i64>,
) -> ApiResult<Json<Value>> {
  owned_course(&state, &account, course_id, "delete").await?;
  state.store.delete_course(course_id).await?;
  Ok(Json(json!({ "message": "Course deleted successfully." })))
}

/// Resolve a course and confirm the caller's college owns it.
async fn owned_course<S: AdmissionsStore>(
  state: &AppState<S>,
  account: &Account,
  course_id: i64,
  action: &str,
) -> ApiResult<Course> {
  let denied = || {
    ApiError::forbidden(format!(
      "You don't have permission to {action} this course."
    ))
  };
  let college = account.college().ok_or_else(denied)?;
  let course = state
    .store
    .get_course(course_id)
    .await?
    .ok_or(Error::CourseNotFound(course_id))?;
  if course.college_id != college.id {
    return Err(denied());
  }
  Ok(course)
}

fn check_update(update: &CourseUpdate) -> ApiResult<()> {
  if let Some(name) = &update.name
    && name.trim().is_empty()
  {
    return Err(ApiError::bad_request("course name must not be empty"));
  }
  if update.duration == Some(0) {
    return Err(ApiError::bad_request(
      "course duration must be at least one year",
    ));
  }
  Ok(())
}
