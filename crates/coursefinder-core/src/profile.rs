//! Role-specific profile records and the tagged account union.
//!
//! The original system detected account kinds by probing for profile
//! attributes at runtime. Here the kind is an explicit enum carrying the
//! matching profile, so every permission check is an exhaustive match.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  error::{Error, Result},
  user::{NewUser, Role, User},
};

// ─── Student ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
  Male,
  Female,
  Other,
}

/// Demographic and academic fields a student supplies at registration.
/// Everything is optional except the linked identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentFields {
  pub phone_number:          Option<String>,
  pub date_of_birth:         Option<NaiveDate>,
  pub gender:                Option<Gender>,
  pub school_name:           Option<String>,
  pub highest_qualification: Option<String>,
  pub marks_percentage:      Option<f64>,
  pub passing_year:          Option<u32>,
  pub street:                Option<String>,
  pub district:              Option<String>,
  pub state:                 Option<String>,
}

impl StudentFields {
  pub fn validate(&self) -> Result<()> {
    if let Some(marks) = self.marks_percentage
      && !(0.0..=100.0).contains(&marks)
    {
      return Err(Error::Validation(format!(
        "marks_percentage must be between 0 and 100, got {marks}"
      )));
    }
    Ok(())
  }
}

/// A student profile, one-to-one with a [`User`] of role `student`.
///
/// `verified` is set when the email ownership check succeeds; a row only
/// exists once registration (including that check) completed.
#[derive(Debug, Clone, Serialize)]
pub struct StudentProfile {
  pub id:       i64,
  pub user_id:  i64,
  #[serde(flatten)]
  pub fields:   StudentFields,
  pub verified: bool,
}

/// Input for registering a student: identity plus profile fields.
#[derive(Debug, Clone)]
pub struct NewStudent {
  pub user:   NewUser,
  pub fields: StudentFields,
}

/// Partial update for a student's identity and profile. `None` leaves the
/// field unchanged; clearing a field is not supported.
#[derive(Debug, Clone, Default)]
pub struct StudentUpdate {
  pub username:              Option<String>,
  pub email:                 Option<String>,
  pub password_hash:         Option<String>,
  pub phone_number:          Option<String>,
  pub date_of_birth:         Option<NaiveDate>,
  pub gender:                Option<Gender>,
  pub school_name:           Option<String>,
  pub highest_qualification: Option<String>,
  pub marks_percentage:      Option<f64>,
  pub passing_year:          Option<u32>,
  pub street:                Option<String>,
  pub district:              Option<String>,
  pub state:                 Option<String>,
}

impl StudentUpdate {
  /// Identity fields, when supplied, must still satisfy the registration
  /// rules: a non-blank username and a plausible email. `None` stays
  /// untouched; there is no way to clear either.
  pub fn validate(&self) -> Result<()> {
    if let Some(username) = &self.username
      && username.trim().is_empty()
    {
      return Err(Error::Validation("username must not be empty".into()));
    }
    if let Some(email) = &self.email
      && (email.trim().is_empty() || !email.contains('@'))
    {
      return Err(Error::Validation("a valid email is required".into()));
    }
    Ok(())
  }
}

/// A student row joined with its identity fields, for admin listings.
#[derive(Debug, Clone, Serialize)]
pub struct StudentRecord {
  pub username: String,
  pub email:    String,
  #[serde(flatten)]
  pub profile:  StudentProfile,
}

// ─── College ─────────────────────────────────────────────────────────────────

/// Descriptive fields a college supplies at registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollegeFields {
  pub name:        String,
  /// Media paths; upload handling itself lives outside this service.
  pub logo:        Option<String>,
  pub image:       Option<String>,
  pub street:      Option<String>,
  pub state:       Option<String>,
  pub district:    Option<String>,
  pub description: Option<String>,
}

impl CollegeFields {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::Validation("college name must not be empty".into()));
    }
    Ok(())
  }
}

/// A college profile, one-to-one with a [`User`] of role `college`.
///
/// `is_approved` starts false and flips true only through an admin action.
#[derive(Debug, Clone, Serialize)]
pub struct CollegeProfile {
  pub id:          i64,
  pub user_id:     i64,
  #[serde(flatten)]
  pub fields:      CollegeFields,
  pub is_approved: bool,
}

/// Input for registering a college: identity plus profile fields.
#[derive(Debug, Clone)]
pub struct NewCollege {
  pub user:   NewUser,
  pub fields: CollegeFields,
}

/// Partial update for a college profile. `is_approved` is deliberately
/// absent; approval only moves through the moderation operation.
#[derive(Debug, Clone, Default)]
pub struct CollegeUpdate {
  pub password_hash: Option<String>,
  pub name:          Option<String>,
  pub logo:          Option<String>,
  pub image:         Option<String>,
  pub street:        Option<String>,
  pub state:         Option<String>,
  pub district:      Option<String>,
  pub description:   Option<String>,
}

impl CollegeUpdate {
  pub fn validate(&self) -> Result<()> {
    if let Some(name) = &self.name
      && name.trim().is_empty()
    {
      return Err(Error::Validation("college name must not be empty".into()));
    }
    Ok(())
  }
}

// ─── Account ─────────────────────────────────────────────────────────────────

/// The profile attached to an identity, tagged by account kind.
#[derive(Debug, Clone)]
pub enum AccountProfile {
  Admin,
  Student(StudentProfile),
  College(CollegeProfile),
}

impl AccountProfile {
  pub fn role(&self) -> Role {
    match self {
      AccountProfile::Admin => Role::Admin,
      AccountProfile::Student(_) => Role::Student,
      AccountProfile::College(_) => Role::College,
    }
  }
}

/// An identity together with its role-specific profile.
#[derive(Debug, Clone)]
pub struct Account {
  pub user:    User,
  pub profile: AccountProfile,
}

impl Account {
  pub fn is_admin(&self) -> bool {
    matches!(self.profile, AccountProfile::Admin)
  }

  pub fn student(&self) -> Option<&StudentProfile> {
    match &self.profile {
      AccountProfile::Student(p) => Some(p),
      _ => None,
    }
  }

  pub fn college(&self) -> Option<&CollegeProfile> {
    match &self.profile {
      AccountProfile::College(p) => Some(p),
      _ => None,
    }
  }
}
