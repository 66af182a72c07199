//! Chatbot relay: canned small-talk answers plus an OpenAI-compatible
//! upstream for everything else.
//!
//! The upstream is reached through the [`ChatRelay`] trait so handlers never
//! hold a concrete HTTP client; tests substitute a canned implementation.

use std::{future::Future, pin::Pin};

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

pub const SYSTEM_PROMPT: &str =
  "You are a helpful assistant. You reply with very short answers.";

#[derive(Debug, Error)]
pub enum ChatError {
  #[error("chat relay is not configured")]
  Disabled,
  #[error("upstream chat request failed: {0}")]
  Upstream(String),
  #[error("malformed upstream response: {0}")]
  Malformed(String),
}

pub trait ChatRelay: Send + Sync {
  fn reply<'a>(
    &'a self,
    message: &'a str,
  ) -> Pin<Box<dyn Future<Output = Result<String, ChatError>> + Send + 'a>>;
}

// ─── Canned answers ──────────────────────────────────────────────────────────

/// Fixed replies for common greetings; anything else goes upstream.
pub fn static_reply(message: &str) -> Option<&'static str> {
  match message.trim().to_lowercase().as_str() {
    "hi" => Some("Hello! How can I assist you today?"),
    "hello" => Some("Hi there! How can I help you?"),
    "how are you" => {
      Some("I'm just a chatbot, but I'm doing great! How about you?")
    }
    "bye" => Some("Goodbye! Take care."),
    "whats up" => Some(
      "Not much, just here to help you with queries. How can I help you today?",
    ),
    _ => None,
  }
}

/// Rewrite `*text*` emphasis pairs as `<b>text</b>`. Unpaired asterisks are
/// left untouched.
pub fn format_emphasis(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  let mut rest = input;
  while let Some(open) = rest.find('*') {
    let Some(close) = rest[open + 1..].find('*') else { break };
    out.push_str(&rest[..open]);
    out.push_str("<b>");
    out.push_str(&rest[open + 1..open + 1 + close]);
    out.push_str("</b>");
    rest = &rest[open + close + 2..];
  }
  out.push_str(rest);
  out
}

// ─── Upstream relay ──────────────────────────────────────────────────────────

/// Relay backed by an OpenAI-compatible chat completions endpoint.
pub struct GroqRelay {
  http:    reqwest::Client,
  url:     String,
  api_key: String,
  model:   String,
}

impl GroqRelay {
  pub fn new(url: String, api_key: String, model: String) -> Self {
    Self { http: reqwest::Client::new(), url, api_key, model }
  }
}

#[derive(Deserialize)]
struct Completion {
  choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
  message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
  content: String,
}

impl ChatRelay for GroqRelay {
  fn reply<'a>(
    &'a self,
    message: &'a str,
  ) -> Pin<Box<dyn Future<Output = Result<String, ChatError>> + Send + 'a>> {
    Box::pin(async move {
      let body = json!({
        "model": self.model,
        "messages": [
          { "role": "system", "content": SYSTEM_PROMPT },
          { "role": "user",   "content": message },
        ],
        "max_tokens": 100,
        "temperature": 1.2,
      });

      let resp = self
        .http
        .post(&self.url)
        .bearer_auth(&self.api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| ChatError::Upstream(e.to_string()))?;

      let status = resp.status();
      if !status.is_success() {
        return Err(ChatError::Upstream(format!("upstream returned {status}")));
      }

      let completion: Completion = resp
        .json()
        .await
        .map_err(|e| ChatError::Malformed(e.to_string()))?;
      let content = completion
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| ChatError::Malformed("no choices in response".into()))?;

      Ok(format_emphasis(&content))
    })
  }
}

/// Relay installed when no API key is configured.
pub struct DisabledRelay;

impl ChatRelay for DisabledRelay {
  fn reply<'a>(
    &'a self,
    _message: &'a str,
  ) -> Pin<Box<dyn Future<Output = Result<String, ChatError>> + Send + 'a>> {
    Box::pin(async { Err(ChatError::Disabled) })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn static_replies_trim_and_lowercase() {
    assert_eq!(static_reply("hi"), Some("Hello! How can I assist you today?"));
    assert_eq!(static_reply("  HELLO "), Some("Hi there! How can I help you?"));
    assert_eq!(static_reply("Bye"), Some("Goodbye! Take care."));
    assert!(static_reply("what courses does hillside offer").is_none());
  }

  #[test]
  fn emphasis_pairs_become_bold_tags() {
    assert_eq!(format_emphasis("plain text"), "plain text");
    assert_eq!(format_emphasis("a *bold* word"), "a <b>bold</b> word");
    assert_eq!(
      format_emphasis("*one* and *two*"),
      "<b>one</b> and <b>two</b>"
    );
  }

  #[test]
  fn unpaired_asterisk_is_left_alone() {
    assert_eq!(format_emphasis("lonely *"), "lonely *");
    assert_eq!(format_emphasis("a * b * c"), "a <b> b </b> c");
  }
}
