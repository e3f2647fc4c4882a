//! Handlers for `/hearings` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/hearings` | Hearings on cases the caller is party to |
//! | `GET`  | `/hearings/{id}` | 404 if not visible to the caller |
//! | `POST` | `/hearings` | Clerks or the case's judge; body: [`NewHearing`]; returns 201 |
//! | `POST` | `/hearings/{id}/reschedule` | Body: [`Reschedule`]; appends to the history |
//! | `POST` | `/hearings/{id}/status` | Body: `{"status": "completed"}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use courtly_core::{
  hearing::{Hearing, HearingStatus, NewHearing, Reschedule},
  repo::CourtRepository,
  store::KvStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{auth::Authenticated, error::ApiError};

/// `GET /hearings`
pub async fn list<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
) -> Result<Json<Vec<Hearing>>, ApiError>
where
  S: KvStore,
{
  Ok(Json(repo.visible_hearings(Some(&actor)).await?))
}

/// `GET /hearings/{id}`
pub async fn get_one<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Hearing>, ApiError>
where
  S: KvStore,
{
  repo
    .visible_hearings(Some(&actor))
    .await?
    .into_iter()
    .find(|h| h.id == id)
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("hearing {id} not found")))
}

/// `POST /hearings`
pub async fn create<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
  Json(body): Json<NewHearing>,
) -> Result<impl IntoResponse, ApiError>
where
  S: KvStore,
{
  let hearing = repo.schedule_hearing(&actor, body).await?;
  Ok((StatusCode::CREATED, Json(hearing)))
}

/// `POST /hearings/{id}/reschedule`
pub async fn reschedule<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<Reschedule>,
) -> Result<Json<Hearing>, ApiError>
where
  S: KvStore,
{
  Ok(Json(repo.reschedule_hearing(&actor, id, body).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: HearingStatus,
}

/// `POST /hearings/{id}/status`
pub async fn update_status<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Hearing>, ApiError>
where
  S: KvStore,
{
  Ok(Json(repo.set_hearing_status(&actor, id, body.status).await?))
}
