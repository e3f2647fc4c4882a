//! Handlers for `/messages` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/messages` | `?box=inbox` (default) or `?box=sent`; newest first |
//! | `POST` | `/messages` | Body: [`NewMessage`]; returns 201 |
//! | `POST` | `/messages/{id}/read` | Recipient only |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use courtly_core::{
  message::{Message, NewMessage},
  repo::CourtRepository,
  store::KvStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{auth::Authenticated, error::ApiError};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mailbox {
  #[default]
  Inbox,
  Sent,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default, rename = "box")]
  pub mailbox: Mailbox,
}

/// `GET /messages[?box=sent]`
pub async fn list<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Message>>, ApiError>
where
  S: KvStore,
{
  let messages = match params.mailbox {
    Mailbox::Inbox => repo.inbox(&actor).await?,
    Mailbox::Sent => repo.sent(&actor).await?,
  };
  Ok(Json(messages))
}

/// `POST /messages`
pub async fn send<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
  Json(body): Json<NewMessage>,
) -> Result<impl IntoResponse, ApiError>
where
  S: KvStore,
{
  let message = repo.send_message(&actor, body).await?;
  Ok((StatusCode::CREATED, Json(message)))
}

/// `POST /messages/{id}/read`
pub async fn mark_read<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Message>, ApiError>
where
  S: KvStore,
{
  Ok(Json(repo.mark_read(&actor, id).await?))
}
