//! Error types for `courtly-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// Missing or malformed required input.
  #[error("validation failed: {0}")]
  Validation(String),

  /// A calendar range that cannot be resolved. Callers of the calendar
  /// functions never see this; it is logged and replaced by a fallback.
  #[error("invalid calendar range: {0}")]
  InvalidRange(String),

  /// A state-machine precondition was violated. Nothing was changed.
  #[error("cannot move {entity} {id} from {from} to {to}")]
  InvalidTransition {
    entity: &'static str,
    id:     Uuid,
    from:   String,
    to:     String,
  },

  #[error("unparseable date or time: {0:?}")]
  Parse(String),

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: Uuid },

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
