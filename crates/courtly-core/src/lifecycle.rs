//! Case requests and their three-state lifecycle.
//!
//! A request starts `pending` and makes exactly one terminal transition:
//! `accepted` (which yields a new active [`Case`]) or `rejected`. The
//! pending-state precondition is the only guard against applying either
//! transition twice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  case::{Case, CaseStatus},
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestStatus {
  Pending,
  Accepted,
  Rejected,
}

impl RequestStatus {
  pub fn is_terminal(self) -> bool { !matches!(self, Self::Pending) }
}

/// A client's proposal for representation, awaiting the lawyer's decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRequest {
  pub id:          Uuid,
  pub client_id:   Uuid,
  pub lawyer_id:   Uuid,
  pub case_title:  String,
  pub description: String,
  pub status:      RequestStatus,
  pub created_at:  DateTime<Utc>,
}

impl CaseRequest {
  /// Create a pending request. The nil UUID counts as a blank id.
  pub fn create(
    client_id: Uuid,
    lawyer_id: Uuid,
    case_title: &str,
    description: &str,
    now: DateTime<Utc>,
  ) -> Result<Self> {
    if client_id.is_nil() {
      return Err(Error::Validation("client id is required".into()));
    }
    if lawyer_id.is_nil() {
      return Err(Error::Validation("lawyer id is required".into()));
    }
    if case_title.trim().is_empty() {
      return Err(Error::Validation("case title is required".into()));
    }
    Ok(Self {
      id: Uuid::new_v4(),
      client_id,
      lawyer_id,
      case_title: case_title.trim().to_owned(),
      description: description.to_owned(),
      status: RequestStatus::Pending,
      created_at: now,
    })
  }

  fn require_pending(&self, to: RequestStatus) -> Result<()> {
    if self.status != RequestStatus::Pending {
      return Err(Error::InvalidTransition {
        entity: "case request",
        id:     self.id,
        from:   self.status.to_string(),
        to:     to.to_string(),
      });
    }
    Ok(())
  }

  /// Accept the request and return the case it spawns.
  ///
  /// On error the request is left untouched and no case is produced.
  pub fn accept(&mut self, case_number: String, now: DateTime<Utc>) -> Result<Case> {
    self.require_pending(RequestStatus::Accepted)?;
    self.status = RequestStatus::Accepted;
    Ok(Case {
      id: Uuid::new_v4(),
      title: self.case_title.clone(),
      description: self.description.clone(),
      case_number,
      status: CaseStatus::Active,
      client_id: self.client_id,
      lawyer_id: Some(self.lawyer_id),
      judge_id: None,
      judge_name: None,
      created_at: now,
      updated_at: now,
      filed_date: now.date_naive(),
      judgement: None,
    })
  }

  pub fn reject(&mut self) -> Result<()> {
    self.require_pending(RequestStatus::Rejected)?;
    self.status = RequestStatus::Rejected;
    Ok(())
  }
}
