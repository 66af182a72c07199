//! Admin-only moderation endpoints.

use axum::{
  Json,
  extract::{Path, State},
};
use coursefinder_core::{
  profile::{Account, StudentRecord},
  store::AdmissionsStore,
};
use serde_json::{Value, json};

use crate::{
  AppState,
  auth::AuthAccount,
  error::{ApiError, ApiResult},
};

fn require_admin(account: &Account) -> ApiResult<()> {
  if account.is_admin() {
    Ok(())
  } else {
    Err(ApiError::forbidden("Admin access required"))
  }
}

pub async fn approve_college<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
  Path(college_id): Path<i64>,
) -> ApiResult<Json<Value>> {
  require_admin(&account)?;
  let profile = state.store.approve_college(college_id).await?;
  Ok(Json(json!({
    "message": format!("College '{}' has been approved.", profile.fields.name)
  })))
}

pub async fn delete_college<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
  Path(college_id): Path<i64>,
) -> ApiResult<Json<Value>> {
  require_admin(&account)?;
  let profile = state.store.delete_college(college_id).await?;
  Ok(Json(json!({
    "message": format!("College '{}' has been deleted.", profile.fields.name)
  })))
}

pub async fn all_users<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  AuthAccount(account): AuthAccount,
) -> ApiResult<Json<Vec<StudentRecord>>> {
  require_admin(&account)?;
  Ok(Json(state.store.list_students().await?))
}
