//! Cases and their one-directional status workflow.

use chrono::{DateTime, NaiveDate, Utc};
use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  user::{Actor, Role},
};

// ─── Status ──────────────────────────────────────────────────────────────────

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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CaseStatus {
  Pending,
  Active,
  InProgress,
  Closed,
  Dismissed,
}

impl CaseStatus {
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Closed | Self::Dismissed)
  }

  /// Forward moves that do not need a judgement.
  pub fn can_advance_to(self, next: CaseStatus) -> bool {
    matches!(
      (self, next),
      (Self::Pending, Self::Active) | (Self::Active, Self::InProgress)
    )
  }
}

/// The terminal outcome a judge may record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  Closed,
  Dismissed,
}

impl From<Outcome> for CaseStatus {
  fn from(o: Outcome) -> Self {
    match o {
      Outcome::Closed => Self::Closed,
      Outcome::Dismissed => Self::Dismissed,
    }
  }
}

/// A judge-issued judgement; attaching one makes the case terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Judgement {
  pub outcome:   Outcome,
  pub text:      String,
  pub issued_by: Uuid,
  pub issued_at: DateTime<Utc>,
}

// ─── Case ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
  pub id:          Uuid,
  pub title:       String,
  pub description: String,
  pub case_number: String,
  pub status:      CaseStatus,
  pub client_id:   Uuid,
  #[serde(default)]
  pub lawyer_id:   Option<Uuid>,
  #[serde(default)]
  pub judge_id:    Option<Uuid>,
  #[serde(default)]
  pub judge_name:  Option<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
  pub filed_date:  NaiveDate,
  #[serde(default)]
  pub judgement:   Option<Judgement>,
}

/// Input for a case filed directly by a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCase {
  pub title:       String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub lawyer_id:   Option<Uuid>,
}

impl Case {
  /// Build a freshly filed case in `pending` state.
  pub fn file(
    input: NewCase,
    client_id: Uuid,
    case_number: String,
    now: DateTime<Utc>,
  ) -> Result<Self> {
    if input.title.trim().is_empty() {
      return Err(Error::Validation("case title is required".into()));
    }
    Ok(Self {
      id: Uuid::new_v4(),
      title: input.title,
      description: input.description,
      case_number,
      status: CaseStatus::Pending,
      client_id,
      lawyer_id: input.lawyer_id,
      judge_id: None,
      judge_name: None,
      created_at: now,
      updated_at: now,
      filed_date: now.date_naive(),
      judgement: None,
    })
  }

  /// Whether `actor` is a party to this case. Clerks see every case.
  pub fn involves(&self, actor: &Actor) -> bool {
    match actor.role {
      Role::Clerk => true,
      Role::Client => self.client_id == actor.id,
      Role::Lawyer => self.lawyer_id == Some(actor.id),
      Role::Judge => {
        self.judge_id == Some(actor.id)
          || self.judge_name.as_deref() == Some(actor.name.as_str())
      }
    }
  }

  fn transition_error(&self, to: CaseStatus) -> Error {
    Error::InvalidTransition {
      entity: "case",
      id:     self.id,
      from:   self.status.to_string(),
      to:     to.to_string(),
    }
  }

  /// Move the case forward without a judgement (pending → active →
  /// in_progress).
  pub fn advance(&mut self, next: CaseStatus, now: DateTime<Utc>) -> Result<()> {
    if !self.status.can_advance_to(next) {
      return Err(self.transition_error(next));
    }
    self.status = next;
    self.updated_at = now;
    Ok(())
  }

  pub fn assign_judge(&mut self, judge: &Actor, now: DateTime<Utc>) -> Result<()> {
    if self.status.is_terminal() {
      return Err(Error::Validation(format!(
        "case {} is {} and can no longer be assigned",
        self.case_number, self.status
      )));
    }
    self.judge_id = Some(judge.id);
    self.judge_name = Some(judge.name.clone());
    self.updated_at = now;
    Ok(())
  }

  /// Record a judgement, ending the case. A `pending` case can only be
  /// dismissed.
  pub fn issue_judgement(
    &mut self,
    outcome: Outcome,
    text: String,
    judge: &Actor,
    now: DateTime<Utc>,
  ) -> Result<()> {
    let to = CaseStatus::from(outcome);
    if self.status.is_terminal()
      || (self.status == CaseStatus::Pending && outcome == Outcome::Closed)
    {
      return Err(self.transition_error(to));
    }
    if text.trim().is_empty() {
      return Err(Error::Validation("judgement text is required".into()));
    }
    self.status = to;
    self.judgement = Some(Judgement {
      outcome,
      text,
      issued_by: judge.id,
      issued_at: now,
    });
    self.updated_at = now;
    Ok(())
  }
}

// ─── Case numbers ────────────────────────────────────────────────────────────

/// Draw a case number of the form `C-#####` (five digits, no leading zero).
pub fn generate_case_number(rng: &mut impl RngCore) -> String {
  format!("C-{}", 10_000 + rng.next_u32() % 90_000)
}

#[cfg(test)]
mod tests {
  use rand_core::OsRng;

  use super::*;

  fn actor(role: Role, name: &str) -> Actor {
    Actor { id: Uuid::new_v4(), name: name.into(), role }
  }

  fn filed(client: &Actor) -> Case {
    Case::file(
      NewCase {
        title:       "Smith v. Jones".into(),
        description: String::new(),
        lawyer_id:   None,
      },
      client.id,
      "C-12345".into(),
      Utc::now(),
    )
    .unwrap()
  }

  #[test]
  fn case_number_has_expected_shape() {
    for _ in 0..100 {
      let n = generate_case_number(&mut OsRng);
      assert_eq!(n.len(), 7, "{n}");
      assert!(n.starts_with("C-"));
      assert!(n[2..].chars().all(|c| c.is_ascii_digit()));
    }
  }

  #[test]
  fn filing_requires_a_title() {
    let err = Case::file(
      NewCase { title: "  ".into(), description: String::new(), lawyer_id: None },
      Uuid::new_v4(),
      "C-10000".into(),
      Utc::now(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[test]
  fn status_only_moves_forward() {
    let client = actor(Role::Client, "Cal");
    let mut case = filed(&client);
    assert_eq!(case.status, CaseStatus::Pending);

    case.advance(CaseStatus::Active, Utc::now()).unwrap();
    case.advance(CaseStatus::InProgress, Utc::now()).unwrap();

    let err = case.advance(CaseStatus::Active, Utc::now()).unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
    let err = case.advance(CaseStatus::Closed, Utc::now()).unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
  }

  #[test]
  fn judgement_is_terminal() {
    let client = actor(Role::Client, "Cal");
    let judge = actor(Role::Judge, "Hon. Reyes");
    let mut case = filed(&client);
    case.advance(CaseStatus::Active, Utc::now()).unwrap();

    case
      .issue_judgement(Outcome::Dismissed, "No standing.".into(), &judge, Utc::now())
      .unwrap();
    assert_eq!(case.status, CaseStatus::Dismissed);
    assert_eq!(case.judgement.as_ref().unwrap().issued_by, judge.id);

    let err = case
      .issue_judgement(Outcome::Closed, "Again.".into(), &judge, Utc::now())
      .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
  }

  #[test]
  fn pending_case_can_be_dismissed_but_not_closed() {
    let client = actor(Role::Client, "Cal");
    let judge = actor(Role::Judge, "Hon. Reyes");
    let mut case = filed(&client);

    let err = case
      .issue_judgement(Outcome::Closed, "Settled.".into(), &judge, Utc::now())
      .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
    assert_eq!(case.status, CaseStatus::Pending);
    assert!(case.judgement.is_none());

    case
      .issue_judgement(Outcome::Dismissed, "Filed in error.".into(), &judge, Utc::now())
      .unwrap();
    assert_eq!(case.status, CaseStatus::Dismissed);
  }

  #[test]
  fn judge_matches_by_id_or_name() {
    let client = actor(Role::Client, "Cal");
    let judge = actor(Role::Judge, "Hon. Reyes");
    let mut case = filed(&client);
    assert!(!case.involves(&judge));

    case.judge_name = Some("Hon. Reyes".into());
    assert!(case.involves(&judge));

    case.judge_name = None;
    case.judge_id = Some(judge.id);
    assert!(case.involves(&judge));

    assert!(case.involves(&client));
    assert!(case.involves(&actor(Role::Clerk, "Kim")));
    assert!(!case.involves(&actor(Role::Lawyer, "Lee")));
  }
}
