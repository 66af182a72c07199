//! Student-authored college reviews.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct Review {
  pub id:          i64,
  pub student_id:  i64,
  pub college_id:  i64,
  /// Integer rating in `[1, 5]`.
  pub rating:      i32,
  pub review_text: Option<String>,
  pub created_at:  DateTime<Utc>,
}

/// Input for creating a review. There is no edit or delete operation, and a
/// student may review the same college more than once.
#[derive(Debug, Clone)]
pub struct NewReview {
  pub student_id:  i64,
  pub college_id:  i64,
  pub rating:      i32,
  pub review_text: Option<String>,
}

impl NewReview {
  pub fn validate(&self) -> Result<()> {
    if !(1..=5).contains(&self.rating) {
      return Err(Error::RatingOutOfRange(self.rating));
    }
    Ok(())
  }
}

/// A review joined with display names for listings.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewEntry {
  #[serde(flatten)]
  pub review:       Review,
  pub student_name: String,
  pub college_name: String,
}
