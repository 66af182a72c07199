//! Contact log endpoints.

use axum::{Json, extract::State, http::StatusCode};
use coursefinder_core::{
  contact::{ContactMessage, NewContact},
  store::AdmissionsStore,
};
use serde::Deserialize;

use crate::{
  AppState,
  auth::AuthAccount,
  error::{ApiError, ApiResult},
};

#[derive(Deserialize)]
pub struct ContactRequest {
  pub name:    String,
  pub email:   String,
  pub subject: String,
  pub message: String,
}

pub async fn create_message<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
  Json(body): Json<ContactRequest>,
) -> ApiResult<(StatusCode, Json<ContactMessage>)> {
  if [&body.name, &body.email, &body.subject, &body.message]
    .iter()
    .any(|f| f.trim().is_empty())
  {
    return Err(ApiError::bad_request("all contact fields are required"));
  }

  let created = state
    .store
    .create_contact(NewContact {
      user_id: account.user.id,
      name:    body.name,
      email:   body.email,
      subject: body.subject,
      message: body.message,
      role:    account.user.role,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(created)))
}

/// Admins see every message; everyone else sees their own.
pub async fn list_messages<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
) -> ApiResult<Json<Vec<ContactMessage>>> {
  let messages = if account.is_admin() {
    state.store.list_all_contacts().await?
  } else {
    state.store.list_user_contacts(account.user.id).await?
  };
  Ok(Json(messages))
}
