//! HTTP Basic authentication and the editor allowlist.
//!
//! Reads are public. Handlers that write take an [`Editor`] argument, which
//! resolves only when the request carries valid credentials for a user on
//! the allowlist.

use std::collections::{BTreeMap, BTreeSet};

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use lineage_core::store::MemberStore;
use rand_core::OsRng;
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

/// Lowercase and trim an email so lookups ignore case and padding.
fn normalize_email(raw: &str) -> String { raw.trim().to_ascii_lowercase() }

/// A user who may authenticate.
#[derive(Clone, Debug, Deserialize)]
pub struct UserCredentials {
  pub email:         String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Emails permitted to create, update and delete members.
#[derive(Clone, Debug, Default)]
pub struct EditorAllowlist(BTreeSet<String>);

impl EditorAllowlist {
  /// Build from raw entries. Blank entries are dropped.
  pub fn new<I, S>(emails: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    Self(
      emails
        .into_iter()
        .map(|e| normalize_email(e.as_ref()))
        .filter(|e| !e.is_empty())
        .collect(),
    )
  }

  pub fn contains(&self, email: &str) -> bool { self.0.contains(&normalize_email(email)) }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn len(&self) -> usize { self.0.len() }
}

/// Who may authenticate, and which of them may edit.
#[derive(Clone, Debug)]
pub struct AccessPolicy {
  users:      BTreeMap<String, String>,
  editors:    EditorAllowlist,
  /// Verified against when the email is unknown, so both failures cost one
  /// argon2 run.
  dummy_hash: Option<String>,
}

impl Default for AccessPolicy {
  fn default() -> Self { Self::new([], EditorAllowlist::default()) }
}

impl AccessPolicy {
  pub fn new(users: impl IntoIterator<Item = UserCredentials>, editors: EditorAllowlist) -> Self {
    let users = users
      .into_iter()
      .map(|u| (normalize_email(&u.email), u.password_hash))
      .collect();
    let salt = SaltString::generate(&mut OsRng);
    let dummy_hash = Argon2::default()
      .hash_password(b"lineage-unknown-user", &salt)
      .map(|h| h.to_string())
      .ok();
    if dummy_hash.is_none() {
      tracing::warn!("could not prepare dummy password hash");
    }
    Self { users, editors, dummy_hash }
  }

  pub fn editors(&self) -> &EditorAllowlist { &self.editors }

  /// Check the `Authorization` header and return the caller's normalised
  /// email.
  pub fn authenticate(&self, headers: &HeaderMap) -> Result<String, ApiError> {
    let header_val = headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthorized)?;

    let encoded = header_val
      .strip_prefix("Basic ")
      .ok_or(ApiError::Unauthorized)?;

    let decoded = B64.decode(encoded.trim()).map_err(|_| ApiError::Unauthorized)?;
    let creds = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

    let (email, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
    let email = normalize_email(email);

    let Some(stored) = self.users.get(&email) else {
      self.burn_dummy_verify(password);
      return Err(ApiError::Unauthorized);
    };
    let parsed_hash = PasswordHash::new(stored).map_err(|_| ApiError::Unauthorized)?;

    Argon2::default()
      .verify_password(password.as_bytes(), &parsed_hash)
      .map_err(|_| ApiError::Unauthorized)?;

    Ok(email)
  }

  fn burn_dummy_verify(&self, password: &str) {
    if let Some(dummy) = &self.dummy_hash
      && let Ok(parsed) = PasswordHash::new(dummy)
    {
      let _ = Argon2::default().verify_password(password.as_bytes(), &parsed);
    }
  }

  /// [`authenticate`](Self::authenticate), then require the allowlist.
  pub fn authorize_editor(&self, headers: &HeaderMap) -> Result<String, ApiError> {
    let email = self.authenticate(headers)?;
    if !self.editors.contains(&email) {
      tracing::warn!(%email, "write rejected: not an editor");
      return Err(ApiError::Forbidden(format!("{email} is not an authorized editor")));
    }
    Ok(email)
  }
}

/// Present in a handler means the request came from an authorized editor.
/// Holds the editor's normalised email.
#[derive(Debug, Clone)]
pub struct Editor(pub String);

impl<S> FromRequestParts<ApiState<S>> for Editor
where
  S: MemberStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    state.access.authorize_editor(&parts.headers).map(Editor)
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn hash(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  fn policy() -> AccessPolicy {
    AccessPolicy::new(
      [
        UserCredentials { email: "Editor@Example.com".into(), password_hash: hash("secret") },
        UserCredentials { email: "reader@example.com".into(), password_hash: hash("hunter2") },
      ],
      EditorAllowlist::new([" EDITOR@example.com ", ""]),
    )
  }

  fn basic(user: &str, pass: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let encoded = B64.encode(format!("{user}:{pass}"));
    headers.insert(
      header::AUTHORIZATION,
      HeaderValue::from_str(&format!("Basic {encoded}")).unwrap(),
    );
    headers
  }

  #[test]
  fn allowlist_normalises_and_drops_blanks() {
    let list = EditorAllowlist::new(["  A@B.com", "", "   ", "a@b.com"]);
    assert_eq!(list.len(), 1);
    assert!(list.contains("A@b.COM"));
  }

  #[test]
  fn correct_credentials() {
    let email = policy().authenticate(&basic("editor@example.com", "secret")).unwrap();
    assert_eq!(email, "editor@example.com");
  }

  #[test]
  fn wrong_password() {
    let res = policy().authenticate(&basic("editor@example.com", "wrong"));
    assert!(matches!(res, Err(ApiError::Unauthorized)));
  }

  #[test]
  fn unknown_user() {
    let res = policy().authenticate(&basic("nobody@example.com", "secret"));
    assert!(matches!(res, Err(ApiError::Unauthorized)));
  }

  #[test]
  fn unknown_user_is_checked_against_a_real_hash() {
    let policy = policy();
    let dummy = policy.dummy_hash.as_deref().expect("dummy hash prepared");
    let parsed = PasswordHash::new(dummy).unwrap();
    assert!(Argon2::default().verify_password(b"secret", &parsed).is_err());

    let res = policy.authenticate(&basic("nobody@example.com", "lineage-unknown-user"));
    assert!(matches!(res, Err(ApiError::Unauthorized)));
  }

  #[test]
  fn missing_header() {
    let res = policy().authenticate(&HeaderMap::new());
    assert!(matches!(res, Err(ApiError::Unauthorized)));
  }

  #[test]
  fn invalid_base64() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic !!!not-base64!!!"));
    assert!(matches!(policy().authenticate(&headers), Err(ApiError::Unauthorized)));
  }

  #[test]
  fn authenticated_non_editor_is_forbidden() {
    let res = policy().authorize_editor(&basic("reader@example.com", "hunter2"));
    assert!(matches!(res, Err(ApiError::Forbidden(_))));
  }

  #[test]
  fn editor_email_match_ignores_case() {
    let email = policy().authorize_editor(&basic("EDITOR@EXAMPLE.COM", "secret")).unwrap();
    assert_eq!(email, "editor@example.com");
  }
}
