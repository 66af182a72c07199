//! Password hashing and JWT issuance/verification, plus the
//! [`AuthAccount`] extractor that loads the caller's account from a bearer
//! token.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use coursefinder_core::{profile::Account, store::AdmissionsStore, user::Role};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash a plaintext password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::internal(format!("argon2 error: {e}")))
}

pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .and_then(|parsed| {
      Argon2::default().verify_password(password.as_bytes(), &parsed)
    })
    .is_ok()
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

const ACCESS_TTL_SECS: i64 = 60 * 60;
const REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
  Access,
  Refresh,
}

/// JWT claims carried by both token kinds. `sub` is the user id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
  pub sub:  i64,
  pub role: Role,
  #[serde(rename = "token_type")]
  pub kind: TokenKind,
  pub iat:  i64,
  pub exp:  i64,
}

pub struct TokenPair {
  pub access:  String,
  pub refresh: String,
}

/// Signs and verifies HS256 tokens with the configured secret.
pub struct TokenIssuer {
  encoding: EncodingKey,
  decoding: DecodingKey,
}

impl TokenIssuer {
  pub fn new(secret: &str) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
    }
  }

  pub fn issue(
    &self,
    user_id: i64,
    role: Role,
    kind: TokenKind,
  ) -> Result<String, ApiError> {
    let now = Utc::now().timestamp();
    let ttl = match kind {
      TokenKind::Access => ACCESS_TTL_SECS,
      TokenKind::Refresh => REFRESH_TTL_SECS,
    };
    let claims = Claims { sub: user_id, role, kind, iat: now, exp: now + ttl };
    encode(&Header::default(), &claims, &self.encoding)
      .map_err(|e| ApiError::internal(format!("token signing failed: {e}")))
  }

  pub fn issue_pair(&self, user_id: i64, role: Role) -> Result<TokenPair, ApiError> {
    Ok(TokenPair {
      access:  self.issue(user_id, role, TokenKind::Access)?,
      refresh: self.issue(user_id, role, TokenKind::Refresh)?,
    })
  }

  /// Verify signature, expiry, and token kind. Any failure collapses to a
  /// 401 so the caller learns nothing about which check tripped.
  pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, ApiError> {
    let data = decode::<Claims>(token, &self.decoding, &Validation::default())
      .map_err(|_| ApiError::unauthorized())?;
    if data.claims.kind != expected {
      return Err(ApiError::unauthorized());
    }
    Ok(data.claims)
  }
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The authenticated caller's account, loaded from the `Authorization:
/// Bearer` header.
pub struct AuthAccount(pub Account);

fn bearer_token(parts: &Parts) -> Option<&str> {
  parts
    .headers
    .get(axum::http::header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
}

impl<S> FromRequestParts<AppState<S>> for AuthAccount
where
  S: AdmissionsStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(parts).ok_or_else(ApiError::unauthorized)?;
    let claims = state.tokens.verify(token, TokenKind::Access)?;

    let account = state
      .store
      .get_account(claims.sub)
      .await?
      .ok_or_else(ApiError::unauthorized)?;
    if !account.user.is_active {
      return Err(ApiError::forbidden("User account is disabled"));
    }

    Ok(AuthAccount(account))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn password_hash_round_trip() {
    let hash = hash_password("hunter2").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("hunter2", &hash));
    assert!(!verify_password("hunter3", &hash));
  }

  #[test]
  fn token_pair_verifies_by_kind() {
    let issuer = TokenIssuer::new("test-secret");
    let pair = issuer.issue_pair(42, Role::Student).unwrap();

    let claims = issuer.verify(&pair.access, TokenKind::Access).unwrap();
    assert_eq!(claims.sub, 42);
    assert_eq!(claims.role, Role::Student);

    assert!(issuer.verify(&pair.access, TokenKind::Refresh).is_err());
    assert!(issuer.verify(&pair.refresh, TokenKind::Access).is_err());
    issuer.verify(&pair.refresh, TokenKind::Refresh).unwrap();
  }

  #[test]
  fn foreign_signature_is_rejected() {
    let issuer = TokenIssuer::new("test-secret");
    let other = TokenIssuer::new("different-secret");
    let token = other.issue(7, Role::Admin, TokenKind::Access).unwrap();
    assert!(issuer.verify(&token, TokenKind::Access).is_err());
  }
}
