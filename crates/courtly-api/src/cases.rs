//! Handlers for `/cases` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/cases` | Cases the caller is party to |
//! | `GET`  | `/cases/{id}` | 403 unless the caller is party to it |
//! | `POST` | `/cases` | Clients only; body: [`NewCase`]; returns 201 |
//! | `POST` | `/cases/{id}/judge` | Clerks only; body: `{"judgeId": ...}` |
//! | `POST` | `/cases/{id}/status` | Body: `{"status": "in_progress"}` |
//! | `POST` | `/cases/{id}/judgement` | The case's judge; body: [`JudgementBody`] |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use courtly_core::{
  case::{Case, CaseStatus, NewCase, Outcome},
  repo::CourtRepository,
  store::KvStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{auth::Authenticated, error::ApiError};

/// `GET /cases`
pub async fn list<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
) -> Result<Json<Vec<Case>>, ApiError>
where
  S: KvStore,
{
  Ok(Json(repo.cases_for(&actor).await?))
}

/// `GET /cases/{id}`
pub async fn get_one<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Case>, ApiError>
where
  S: KvStore,
{
  let case = repo
    .get_case(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("case {id} not found")))?;
  if !case.involves(&actor) {
    return Err(ApiError::Forbidden(format!("not a party to case {}", case.case_number)));
  }
  Ok(Json(case))
}

/// `POST /cases`
pub async fn create<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
  Json(body): Json<NewCase>,
) -> Result<impl IntoResponse, ApiError>
where
  S: KvStore,
{
  let case = repo.file_case(&actor, body).await?;
  Ok((StatusCode::CREATED, Json(case)))
}

// ─── Transitions ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignJudgeBody {
  pub judge_id: Uuid,
}

/// `POST /cases/{id}/judge`
pub async fn assign_judge<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AssignJudgeBody>,
) -> Result<Json<Case>, ApiError>
where
  S: KvStore,
{
  Ok(Json(repo.assign_judge(&actor, id, body.judge_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: CaseStatus,
}

/// `POST /cases/{id}/status`
pub async fn update_status<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Case>, ApiError>
where
  S: KvStore,
{
  Ok(Json(repo.update_case_status(&actor, id, body.status).await?))
}

#[derive(Debug, Deserialize)]
pub struct JudgementBody {
  pub outcome: Outcome,
  pub text:    String,
}

/// `POST /cases/{id}/judgement`
pub async fn judgement<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<JudgementBody>,
) -> Result<Json<Case>, ApiError>
where
  S: KvStore,
{
  Ok(Json(repo.issue_judgement(&actor, id, body.outcome, body.text).await?))
}
