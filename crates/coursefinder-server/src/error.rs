//! API error type: an HTTP status plus a message, rendered as
//! `{"error": "..."}`.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug)]
pub struct ApiError {
  pub status:  StatusCode,
  pub message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
  pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
    Self { status, message: message.into() }
  }

  pub fn bad_request(message: impl Into<String>) -> Self {
    Self::new(StatusCode::BAD_REQUEST, message)
  }

  pub fn unauthorized() -> Self {
    Self::new(StatusCode::UNAUTHORIZED, "Authentication required")
  }

  pub fn forbidden(message: impl Into<String>) -> Self {
    Self::new(StatusCode::FORBIDDEN, message)
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    Self::new(StatusCode::NOT_FOUND, message)
  }

  pub fn internal(message: impl Into<String>) -> Self {
    Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
  }
}

impl From<coursefinder_core::Error> for ApiError {
  fn from(err: coursefinder_core::Error) -> Self {
    use coursefinder_core::Error as E;
    let status = match &err {
      E::UserNotFound(_)
      | E::StudentNotFound(_)
      | E::CollegeNotFound(_)
      | E::CourseNotFound(_)
      | E::ApplicationNotFound(_) => StatusCode::NOT_FOUND,
      E::NotApplicationOwner { .. } => StatusCode::FORBIDDEN,
      E::Storage(_) => {
        tracing::error!("storage error: {err}");
        return Self::internal("internal server error");
      }
      _ => StatusCode::BAD_REQUEST,
    };
    Self::new(status, err.to_string())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let mut resp =
      (self.status, Json(json!({ "error": self.message }))).into_response();
    if self.status == StatusCode::UNAUTHORIZED {
      resp
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    resp
  }
}
