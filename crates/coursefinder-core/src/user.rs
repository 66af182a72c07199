//! User — the identity record every account hangs off.
//!
//! A user holds credentials and a role tag. Role-specific data lives in the
//! profile tables (see [`crate::profile`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role tag stamped on every identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Student,
  College,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Role::Admin => "admin",
      Role::Student => "student",
      Role::College => "college",
    }
  }
}

impl std::fmt::Display for Role {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// An identity record. The password is stored only as an argon2 PHC string;
/// this type is never serialised to API responses directly.
#[derive(Debug, Clone)]
pub struct User {
  pub id:            i64,
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub role:          Role,
  pub is_active:     bool,
  pub last_login:    Option<DateTime<Utc>>,
  pub created_at:    DateTime<Utc>,
}

/// Input for creating an identity row. The hash is produced by the caller;
/// the store never sees a plaintext password.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
}
