//! Error types for `coursefinder-core`.

use thiserror::Error;

use crate::application::ApplicationStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(i64),

  #[error("no student profile for user {0}")]
  StudentNotFound(i64),

  #[error("college not found: {0}")]
  CollegeNotFound(i64),

  #[error("course not found: {0}")]
  CourseNotFound(i64),

  #[error("application not found: {0}")]
  ApplicationNotFound(i64),

  #[error("username already taken: {0}")]
  UsernameTaken(String),

  #[error("email already registered: {0}")]
  EmailTaken(String),

  #[error("you have already applied for this course")]
  AlreadyApplied,

  #[error("payment id already used: {0}")]
  PaymentIdTaken(String),

  #[error("application {application_id} does not belong to college {college_id}")]
  NotApplicationOwner { application_id: i64, college_id: i64 },

  #[error("cannot change application status from {from} to {to}")]
  InvalidTransition {
    from: ApplicationStatus,
    to:   ApplicationStatus,
  },

  #[error("rating must be between 1 and 5, got {0}")]
  RatingOutOfRange(i32),

  #[error("{0}")]
  Validation(String),

  #[error("storage error: {0}")]
  Storage(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
