//! Handlers for `/case-requests` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/case-requests` | Sent (client) or received (lawyer) requests |
//! | `POST` | `/case-requests` | Clients only; body: [`NewRequestBody`]; returns 201 |
//! | `POST` | `/case-requests/{id}/accept` | Addressed lawyer; returns the request and the new case |
//! | `POST` | `/case-requests/{id}/reject` | Addressed lawyer |
//!
//! Answering a request that is no longer pending is a 409.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use courtly_core::{
  case::Case,
  lifecycle::CaseRequest,
  repo::CourtRepository,
  store::KvStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{auth::Authenticated, error::ApiError};

/// `GET /case-requests`
pub async fn list<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
) -> Result<Json<Vec<CaseRequest>>, ApiError>
where
  S: KvStore,
{
  Ok(Json(repo.requests_for(&actor).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequestBody {
  pub lawyer_id:   Uuid,
  pub case_title:  String,
  #[serde(default)]
  pub description: String,
}

/// `POST /case-requests`
pub async fn create<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
  Json(body): Json<NewRequestBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: KvStore,
{
  let request = repo
    .create_request(&actor, body.lawyer_id, &body.case_title, &body.description)
    .await?;
  Ok((StatusCode::CREATED, Json(request)))
}

#[derive(Debug, Serialize)]
pub struct Accepted {
  pub request: CaseRequest,
  pub case:    Case,
}

/// `POST /case-requests/{id}/accept`
pub async fn accept<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Accepted>, ApiError>
where
  S: KvStore,
{
  let (request, case) = repo.accept_request(&actor, id).await?;
  Ok(Json(Accepted { request, case }))
}

/// `POST /case-requests/{id}/reject`
pub async fn reject<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<CaseRequest>, ApiError>
where
  S: KvStore,
{
  Ok(Json(repo.reject_request(&actor, id).await?))
}
