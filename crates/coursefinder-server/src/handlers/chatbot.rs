//! Chatbot endpoint: canned answers first, the configured relay for
//! everything else.

use axum::{Json, extract::State};
use coursefinder_core::store::AdmissionsStore;
use serde_json::{Value, json};

use crate::{
  AppState,
  chat,
  error::{ApiError, ApiResult},
};

pub async fn chatbot<S: AdmissionsStore + 'static>(
  State(state): State<AppState<S>>,
  Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
  let input = body
    .get("userInput")
    .and_then(Value::as_str)
    .map(str::trim)
    .unwrap_or("");
  if input.is_empty() {
    return Err(ApiError::bad_request("No user input provided."));
  }

  if let Some(reply) = chat::static_reply(input) {
    return Ok(Json(json!({ "response": reply })));
  }

  match state.chat.reply(input).await {
    Ok(reply) => Ok(Json(json!({ "response": reply }))),
    Err(e) => {
      Err(ApiError::internal(format!("Failed to get chat response: {e}")))
    }
  }
}
