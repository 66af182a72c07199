//! Course catalog types: courses, college read models, and filter data.

use serde::{Deserialize, Serialize};

use crate::{
  error::{Error, Result},
  profile::CollegeProfile,
};

// ─── Course ──────────────────────────────────────────────────────────────────

/// A course offered by exactly one college. Deleted with its college.
#[derive(Debug, Clone, Serialize)]
pub struct Course {
  pub id:         i64,
  pub college_id: i64,
  pub name:       String,
  /// Length of the programme in years.
  pub duration:   u32,
  pub fee:        u32,
}

/// Input for creating a course under a college.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
  pub name:     String,
  pub duration: u32,
  pub fee:      u32,
}

impl NewCourse {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::Validation("course name must not be empty".into()));
    }
    if self.duration == 0 {
      return Err(Error::Validation(
        "course duration must be at least one year".into(),
      ));
    }
    Ok(())
  }
}

/// Partial update for a course. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseUpdate {
  pub name:     Option<String>,
  pub duration: Option<u32>,
  pub fee:      Option<u32>,
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// A college with its course list — the public browse shape.
#[derive(Debug, Clone, Serialize)]
pub struct CollegeSummary {
  #[serde(flatten)]
  pub college: CollegeProfile,
  pub courses: Vec<Course>,
}

/// A distinct (state, district) pair drawn from college addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
  pub state:    String,
  pub district: String,
}

/// Data used to populate search filters: de-duplicated course names
/// (case-insensitive, first-seen casing wins) and distinct locations.
#[derive(Debug, Clone, Serialize)]
pub struct FilterData {
  pub courses:   Vec<String>,
  pub locations: Vec<Location>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_course_requires_name_and_duration() {
    let ok = NewCourse { name: "B.Tech CS".into(), duration: 4, fee: 50000 };
    assert!(ok.validate().is_ok());

    let unnamed = NewCourse { name: "  ".into(), duration: 4, fee: 50000 };
    assert!(unnamed.validate().is_err());

    let zero_years = NewCourse { name: "B.Sc".into(), duration: 0, fee: 0 };
    assert!(zero_years.validate().is_err());
  }
}
