//! Handlers for `/users` and `/session`.
//!
//! | Method   | Path       | Notes |
//! |----------|------------|-------|
//! | `POST`   | `/users`   | Body: [`RegisterBody`]; unauthenticated; returns 201 + public user |
//! | `GET`    | `/users`   | Optional `?role=`; returns public users |
//! | `POST`   | `/session` | Body: [`LoginBody`]; records the current session |
//! | `GET`    | `/session` | 404 when nobody is logged in |
//! | `DELETE` | `/session` | Clears the current session; 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use courtly_core::{
  repo::CourtRepository,
  store::KvStore,
  user::{NewUser, PublicUser, Role, RoleProfile, Session},
};
use serde::{Deserialize, Serialize};

use crate::{
  auth::{Authenticated, authenticate, hash_password},
  error::ApiError,
};

// ─── Register ─────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /users`. The role-specific fields sit next to
/// the common ones, tagged by `"role"`.
#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub name:     String,
  pub email:    String,
  pub password: String,
  #[serde(flatten)]
  pub profile:  RoleProfile,
}

/// `POST /users`
pub async fn register<S>(
  State(repo): State<Arc<CourtRepository<S>>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: KvStore,
{
  if body.password.is_empty() {
    return Err(ApiError::BadRequest("password is required".into()));
  }
  let user = repo
    .register(NewUser {
      name:          body.name,
      email:         body.email,
      password_hash: hash_password(&body.password)?,
      profile:       body.profile,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(PublicUser::from(&user))))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub role: Option<Role>,
}

/// `GET /users[?role=lawyer]`
pub async fn list<S>(
  Authenticated(_): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<PublicUser>>, ApiError>
where
  S: KvStore,
{
  let users = repo.list_users(params.role).await?;
  Ok(Json(users.iter().map(PublicUser::from).collect()))
}

// ─── Session ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionBody {
  pub session: Session,
  pub user:    PublicUser,
}

/// `POST /session`
pub async fn login<S>(
  State(repo): State<Arc<CourtRepository<S>>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<SessionBody>, ApiError>
where
  S: KvStore,
{
  let user = authenticate(&repo, &body.email, &body.password).await?;
  let session = repo.start_session(&user).await?;
  Ok(Json(SessionBody { session, user: PublicUser::from(&user) }))
}

/// `GET /session`
pub async fn current<S>(
  State(repo): State<Arc<CourtRepository<S>>>,
) -> Result<Json<SessionBody>, ApiError>
where
  S: KvStore,
{
  let (session, user) = repo
    .current_session()
    .await?
    .ok_or_else(|| ApiError::NotFound("no active session".into()))?;
  Ok(Json(SessionBody { session, user }))
}

/// `DELETE /session`
pub async fn logout<S>(
  State(repo): State<Arc<CourtRepository<S>>>,
) -> Result<StatusCode, ApiError>
where
  S: KvStore,
{
  repo.end_session().await?;
  Ok(StatusCode::NO_CONTENT)
}
