//! Contact/messaging log — free-text messages tied to a user.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::user::Role;

#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
  pub id:           i64,
  pub user_id:      i64,
  pub name:         String,
  pub email:        String,
  pub subject:      String,
  pub message:      String,
  /// Role of the sender at submission time.
  pub role:         Role,
  pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewContact {
  pub user_id: i64,
  pub name:    String,
  pub email:   String,
  pub subject: String,
  pub message: String,
  pub role:    Role,
}
