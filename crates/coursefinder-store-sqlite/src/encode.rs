//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, dates as `YYYY-MM-DD`, and
//! enums as their lowercase (or display-cased, for gender) tags.

use chrono::{DateTime, NaiveDate, Utc};
use coursefinder_core::{
  application::{Application, ApplicationStatus},
  contact::ContactMessage,
  profile::{CollegeFields, CollegeProfile, Gender, StudentFields, StudentProfile},
  user::{Role, User},
  Error, Result,
};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Storage(format!("bad timestamp {s:?}: {e}")))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String {
  d.to_string()
}

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  s.parse()
    .map_err(|e| Error::Storage(format!("bad date {s:?}: {e}")))
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  r.as_str()
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "admin" => Ok(Role::Admin),
    "student" => Ok(Role::Student),
    "college" => Ok(Role::College),
    other => Err(Error::Storage(format!("unknown role: {other:?}"))),
  }
}

// ─── ApplicationStatus ───────────────────────────────────────────────────────

pub fn encode_status(s: ApplicationStatus) -> &'static str {
  s.as_str()
}

pub fn decode_status(s: &str) -> Result<ApplicationStatus> {
  match s {
    "pending" => Ok(ApplicationStatus::Pending),
    "approved" => Ok(ApplicationStatus::Approved),
    "rejected" => Ok(ApplicationStatus::Rejected),
    other => Err(Error::Storage(format!("unknown status: {other:?}"))),
  }
}

// ─── Gender ──────────────────────────────────────────────────────────────────

pub fn encode_gender(g: Gender) -> &'static str {
  match g {
    Gender::Male => "Male",
    Gender::Female => "Female",
    Gender::Other => "Other",
  }
}

pub fn decode_gender(s: &str) -> Result<Gender> {
  match s {
    "Male" => Ok(Gender::Male),
    "Female" => Ok(Gender::Female),
    "Other" => Ok(Gender::Other),
    other => Err(Error::Storage(format!("unknown gender: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub id:            i64,
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub role:          String,
  pub is_active:     bool,
  pub last_login:    Option<String>,
  pub created_at:    String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:            self.id,
      username:      self.username,
      email:         self.email,
      password_hash: self.password_hash,
      role:          decode_role(&self.role)?,
      is_active:     self.is_active,
      last_login:    self.last_login.as_deref().map(decode_dt).transpose()?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `students` row.
pub struct RawStudent {
  pub id:                    i64,
  pub user_id:               i64,
  pub phone_number:          Option<String>,
  pub date_of_birth:         Option<String>,
  pub gender:                Option<String>,
  pub school_name:           Option<String>,
  pub highest_qualification: Option<String>,
  pub marks_percentage:      Option<f64>,
  pub passing_year:          Option<i64>,
  pub street:                Option<String>,
  pub district:              Option<String>,
  pub state:                 Option<String>,
  pub verified:              bool,
}

impl RawStudent {
  pub fn into_profile(self) -> Result<StudentProfile> {
    Ok(StudentProfile {
      id:       self.id,
      user_id:  self.user_id,
      fields:   StudentFields {
        phone_number:          self.phone_number,
        date_of_birth:         self
          .date_of_birth
          .as_deref()
          .map(decode_date)
          .transpose()?,
        gender:                self
          .gender
          .as_deref()
          .map(decode_gender)
          .transpose()?,
        school_name:           self.school_name,
        highest_qualification: self.highest_qualification,
        marks_percentage:      self.marks_percentage,
        passing_year:          self.passing_year.map(|y| y as u32),
        street:                self.street,
        district:              self.district,
        state:                 self.state,
      },
      verified: self.verified,
    })
  }
}

/// Raw values read directly from a `colleges` row.
pub struct RawCollege {
  pub id:          i64,
  pub user_id:     i64,
  pub name:        String,
  pub logo:        Option<String>,
  pub image:       Option<String>,
  pub street:      Option<String>,
  pub state:       Option<String>,
  pub district:    Option<String>,
  pub description: Option<String>,
  pub is_approved: bool,
}

impl RawCollege {
  pub fn into_profile(self) -> CollegeProfile {
    CollegeProfile {
      id:          self.id,
      user_id:     self.user_id,
      fields:      CollegeFields {
        name:        self.name,
        logo:        self.logo,
        image:       self.image,
        street:      self.street,
        state:       self.state,
        district:    self.district,
        description: self.description,
      },
      is_approved: self.is_approved,
    }
  }
}

/// Raw values read directly from an `applications` row.
pub struct RawApplication {
  pub id:         i64,
  pub student_id: i64,
  pub college_id: i64,
  pub course_id:  i64,
  pub status:     String,
  pub payment_id: String,
  pub applied_at: String,
}

impl RawApplication {
  pub fn into_application(self) -> Result<Application> {
    Ok(Application {
      id:         self.id,
      student_id: self.student_id,
      college_id: self.college_id,
      course_id:  self.course_id,
      status:     decode_status(&self.status)?,
      payment_id: self.payment_id,
      applied_at: decode_dt(&self.applied_at)?,
    })
  }
}

/// Raw values read directly from a `contacts` row.
pub struct RawContact {
  pub id:           i64,
  pub user_id:      i64,
  pub name:         String,
  pub email:        String,
  pub subject:      String,
  pub message:      String,
  pub role:         String,
  pub submitted_at: String,
}

impl RawContact {
  pub fn into_message(self) -> Result<ContactMessage> {
    Ok(ContactMessage {
      id:           self.id,
      user_id:      self.user_id,
      name:         self.name,
      email:        self.email,
      subject:      self.subject,
      message:      self.message,
      role:         decode_role(&self.role)?,
      submitted_at: decode_dt(&self.submitted_at)?,
    })
  }
}
