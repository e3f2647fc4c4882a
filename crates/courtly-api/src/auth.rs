//! Password hashing and the HTTP Basic-auth extractor.
//!
//! Credentials are `email:password`; the password is checked against the
//! argon2 PHC string stored on the user record.

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use courtly_core::{repo::CourtRepository, store::KvStore, user::{Actor, User}};
use rand_core::OsRng;

use crate::error::ApiError;

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Store(format!("argon2 error: {e}").into()))
}

/// Check `password` against a stored PHC string.
pub fn verify_password(password: &str, phc: &str) -> Result<(), ApiError> {
  let parsed = PasswordHash::new(phc).map_err(|_| ApiError::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .map_err(|_| ApiError::Unauthorized)
}

/// Pull `(user, password)` out of a Basic `Authorization` header.
fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds   = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;

  let (user, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((user.to_owned(), password.to_owned()))
}

/// Look up the user by email and verify the password.
pub async fn authenticate<S: KvStore>(
  repo: &CourtRepository<S>,
  email: &str,
  password: &str,
) -> Result<User, ApiError> {
  let user = repo
    .find_user_by_email(email)
    .await?
    .ok_or(ApiError::Unauthorized)?;
  verify_password(password, &user.password_hash)?;
  Ok(user)
}

/// Present in a handler's arguments means the request carried valid
/// credentials; holds the acting user.
pub struct Authenticated(pub Actor);

impl<S> FromRequestParts<Arc<CourtRepository<S>>> for Authenticated
where
  S: KvStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    repo: &Arc<CourtRepository<S>>,
  ) -> Result<Self, Self::Rejection> {
    let (email, password) = basic_credentials(&parts.headers)?;
    let user = authenticate(repo, &email, &password).await?;
    Ok(Authenticated(user.actor()))
  }
}
