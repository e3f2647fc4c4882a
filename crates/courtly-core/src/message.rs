//! Direct messages between users, optionally about a case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
  pub id:           Uuid,
  pub sender_id:    Uuid,
  pub recipient_id: Uuid,
  #[serde(default)]
  pub case_id:      Option<Uuid>,
  pub subject:      String,
  pub body:         String,
  pub sent_at:      DateTime<Utc>,
  #[serde(default)]
  pub read:         bool,
}

/// Input to [`crate::repo::CourtRepository::send_message`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
  pub recipient_id: Uuid,
  #[serde(default)]
  pub case_id:      Option<Uuid>,
  #[serde(default)]
  pub subject:      String,
  pub body:         String,
}
