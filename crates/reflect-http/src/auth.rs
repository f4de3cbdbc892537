//! HTTP Basic-auth identity resolution.
//!
//! Credentials are checked against the `users` table; the matching row
//! becomes the [`Actor`] of the request.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::OsRng;
use reflect_core::directory::Identity;
use tracing::debug;

use crate::{AppState, error::Error};

/// The authenticated user behind a request.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub Identity);

/// Produce an argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Check `password` against a stored PHC string.
pub fn verify_password(password_hash: &str, password: &str) -> Result<(), Error> {
  let parsed_hash = PasswordHash::new(password_hash).map_err(|_| Error::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)
}

/// Decode `Authorization: Basic ...` into `(username, password)`.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), Error> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val.strip_prefix("Basic ").ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;
  Ok((username.to_owned(), password.to_owned()))
}

impl FromRequestParts<AppState> for Actor {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState,
  ) -> Result<Self, Self::Rejection> {
    let (username, password) = basic_credentials(&parts.headers)?;
    let Some(user) = state.journal.store().find_user(&username).await? else {
      debug!(%username, "unknown user");
      return Err(Error::Unauthorized);
    };
    verify_password(&user.password_hash, &password).inspect_err(|_| {
      debug!(%username, "password mismatch");
    })?;
    Ok(Actor(Identity { user_id: user.user_id, role: user.role }))
  }
}
