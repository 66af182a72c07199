//! Review endpoints.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use coursefinder_core::{
  Error,
  review::{NewReview, ReviewEntry},
  store::AdmissionsStore,
};
use serde::Deserialize;

use crate::{
  AppState,
  auth::AuthAccount,
  error::{ApiError, ApiResult},
};

pub async fn college_reviews<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  Path(college_id): Path<i64>,
) -> ApiResult<Json<Vec<ReviewEntry>>> {
  Ok(Json(state.store.list_college_reviews(college_id).await?))
}

pub async fn all_reviews<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
) -> ApiResult<Json<Vec<ReviewEntry>>> {
  Ok(Json(state.store.list_all_reviews().await?))
}

#[derive(Deserialize)]
pub struct ReviewRequest {
  pub rating:      i32,
  pub review_text: Option<String>,
}

pub async fn create_review<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
  Path(college_id): Path<i64>,
  Json(body): Json<ReviewRequest>,
) -> ApiResult<(StatusCode, Json<ReviewEntry>)> {
  let student = account
    .student()
    .ok_or_else(|| ApiError::bad_request("Invalid student profile."))?;

  let input = NewReview {
    student_id:  student.id,
    college_id,
    rating:      body.rating,
    review_text: body.review_text,
  };
  input.validate()?;

  let entry = state.store.create_review(input).await.map_err(|e| match e {
    Error::CollegeNotFound(_) => ApiError::forbidden("Invalid college ID"),
    other => other.into(),
  })?;
  Ok((StatusCode::CREATED, Json(entry)))
}
