//! Application workflow — the status state machine and its guards.
//!
//! An application links a student, a college, and one of the college's
//! courses. It is created `pending` and moves exactly once, to `approved`
//! or `rejected`, and only at the hand of the college it references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  error::{Error, Result},
  profile::StudentFields,
};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
  Pending,
  Approved,
  Rejected,
}

impl ApplicationStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      ApplicationStatus::Pending => "pending",
      ApplicationStatus::Approved => "approved",
      ApplicationStatus::Rejected => "rejected",
    }
  }

  /// The full transition table: `pending` may move to `approved` or
  /// `rejected`; both of those are terminal.
  pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
    matches!(
      (self, next),
      (ApplicationStatus::Pending, ApplicationStatus::Approved)
        | (ApplicationStatus::Pending, ApplicationStatus::Rejected)
    )
  }

  /// Guard form of [`Self::can_transition_to`].
  pub fn check_transition(self, next: ApplicationStatus) -> Result<()> {
    if self.can_transition_to(next) {
      Ok(())
    } else {
      Err(Error::InvalidTransition { from: self, to: next })
    }
  }
}

impl std::fmt::Display for ApplicationStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Application ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Application {
  pub id:         i64,
  pub student_id: i64,
  pub college_id: i64,
  pub course_id:  i64,
  pub status:     ApplicationStatus,
  /// Reference issued by the external payment step; unique across all
  /// applications. The server performs no payment verification itself.
  pub payment_id: String,
  pub applied_at: DateTime<Utc>,
}

/// Input for creating an application. Always starts `pending`.
#[derive(Debug, Clone)]
pub struct NewApplication {
  pub student_id: i64,
  pub college_id: i64,
  pub course_id:  i64,
  pub payment_id: String,
}

impl NewApplication {
  pub fn validate(&self) -> Result<()> {
    if self.payment_id.trim().is_empty() {
      return Err(Error::Validation(
        "Payment ID is required to apply.".into(),
      ));
    }
    Ok(())
  }
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// An application as a student sees it: joined with display names.
#[derive(Debug, Clone, Serialize)]
pub struct StudentApplication {
  #[serde(flatten)]
  pub application:  Application,
  pub college_name: String,
  pub course_name:  String,
}

/// An application as the receiving college sees it: joined with the
/// applicant's identity, academic record, and the course name.
#[derive(Debug, Clone, Serialize)]
pub struct CollegeApplication {
  pub id:           i64,
  pub status:       ApplicationStatus,
  pub student_name: String,
  pub email:        String,
  pub course_name:  String,
  #[serde(flatten)]
  pub student:      StudentFields,
}
