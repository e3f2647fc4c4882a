//! Hearings and their rescheduling history.
//!
//! Hearings are never deleted. A `scheduled` hearing may be moved (each move
//! appends an immutable [`ReschedulingRecord`]) or closed out as `completed`
//! or `cancelled`, both of which are terminal.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, calendar::parse_calendar_date};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HearingStatus {
  #[default]
  Scheduled,
  Completed,
  Cancelled,
}

/// One entry of a hearing's append-only rescheduling log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReschedulingRecord {
  pub previous_date: String,
  pub previous_time: String,
  pub reason:        String,
  /// Display name of whoever moved the hearing.
  pub changed_by:    String,
  pub changed_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hearing {
  pub id:                   Uuid,
  pub case_id:              Uuid,
  /// Calendar date as entered; records written by older clients may hold
  /// strings that no longer parse.
  pub date:                 String,
  /// Wall-clock time, e.g. `"14:30"`.
  pub time:                 String,
  pub location:             String,
  pub description:          String,
  #[serde(default)]
  pub status:               HearingStatus,
  #[serde(default)]
  pub notes:                Option<String>,
  #[serde(default)]
  pub rescheduled:          bool,
  #[serde(default)]
  pub rescheduling_history: Vec<ReschedulingRecord>,
}

/// Input to [`crate::repo::CourtRepository::schedule_hearing`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHearing {
  pub case_id:     Uuid,
  pub date:        String,
  pub time:        String,
  #[serde(default)]
  pub location:    String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub notes:       Option<String>,
}

/// Input to [`crate::repo::CourtRepository::reschedule_hearing`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reschedule {
  pub date:   String,
  pub time:   String,
  pub reason: String,
}

/// Parse a `HH:MM` or `HH:MM:SS` wall-clock time.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
  let raw = raw.trim();
  NaiveTime::parse_from_str(raw, "%H:%M")
    .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
    .ok()
}

fn validate_slot(date: &str, time: &str) -> Result<()> {
  if parse_calendar_date(date).is_none() {
    return Err(Error::Validation(format!("invalid hearing date {date:?}")));
  }
  if parse_time(time).is_none() {
    return Err(Error::Validation(format!("invalid hearing time {time:?}")));
  }
  Ok(())
}

impl Hearing {
  pub fn schedule(input: NewHearing) -> Result<Self> {
    validate_slot(&input.date, &input.time)?;
    Ok(Self {
      id:                   Uuid::new_v4(),
      case_id:              input.case_id,
      date:                 input.date.trim().to_owned(),
      time:                 input.time.trim().to_owned(),
      location:             input.location,
      description:          input.description,
      status:               HearingStatus::Scheduled,
      notes:                input.notes,
      rescheduled:          false,
      rescheduling_history: Vec::new(),
    })
  }

  /// The calendar day this hearing falls on.
  pub fn calendar_date(&self) -> Result<NaiveDate> {
    parse_calendar_date(&self.date).ok_or_else(|| Error::Parse(self.date.clone()))
  }

  fn require_scheduled(&self, to: &str) -> Result<()> {
    if self.status != HearingStatus::Scheduled {
      return Err(Error::InvalidTransition {
        entity: "hearing",
        id:     self.id,
        from:   self.status.to_string(),
        to:     to.to_owned(),
      });
    }
    Ok(())
  }

  /// Move the hearing to a new slot, logging where it was.
  pub fn reschedule(
    &mut self,
    to: Reschedule,
    changed_by: &str,
    now: DateTime<Utc>,
  ) -> Result<&ReschedulingRecord> {
    self.require_scheduled("rescheduled")?;
    validate_slot(&to.date, &to.time)?;
    if to.reason.trim().is_empty() {
      return Err(Error::Validation("a reason for rescheduling is required".into()));
    }

    let record = ReschedulingRecord {
      previous_date: std::mem::replace(&mut self.date, to.date.trim().to_owned()),
      previous_time: std::mem::replace(&mut self.time, to.time.trim().to_owned()),
      reason:        to.reason,
      changed_by:    changed_by.to_owned(),
      changed_at:    now,
    };
    self.rescheduled = true;
    self.rescheduling_history.push(record);
    Ok(&self.rescheduling_history[self.rescheduling_history.len() - 1])
  }

  pub fn set_status(&mut self, next: HearingStatus) -> Result<()> {
    self.require_scheduled(next.as_ref())?;
    if next == HearingStatus::Scheduled {
      return Err(Error::Validation("hearing is already scheduled".into()));
    }
    self.status = next;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn hearing() -> Hearing {
    Hearing::schedule(NewHearing {
      case_id:     Uuid::new_v4(),
      date:        "2024-06-12".into(),
      time:        "14:30".into(),
      location:    "Courtroom 4".into(),
      description: "Preliminary hearing".into(),
      notes:       None,
    })
    .unwrap()
  }

  #[test]
  fn schedule_validates_slot() {
    let err = Hearing::schedule(NewHearing {
      case_id:     Uuid::new_v4(),
      date:        "next tuesday".into(),
      time:        "14:30".into(),
      location:    String::new(),
      description: String::new(),
      notes:       None,
    })
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = Hearing::schedule(NewHearing {
      case_id:     Uuid::new_v4(),
      date:        "2024-06-12".into(),
      time:        "25:00".into(),
      location:    String::new(),
      description: String::new(),
      notes:       None,
    })
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[test]
  fn reschedule_appends_history() {
    let mut h = hearing();
    let record = h
      .reschedule(
        Reschedule {
          date:   "2024-06-20".into(),
          time:   "09:00".into(),
          reason: "Counsel unavailable".into(),
        },
        "Clerk Kim",
        Utc::now(),
      )
      .unwrap()
      .clone();

    assert_eq!(record.previous_date, "2024-06-12");
    assert_eq!(record.previous_time, "14:30");
    assert_eq!(record.changed_by, "Clerk Kim");
    assert!(h.rescheduled);
    assert_eq!(h.date, "2024-06-20");
    assert_eq!(h.time, "09:00");
    assert_eq!(h.rescheduling_history.len(), 1);
  }

  #[test]
  fn terminal_hearings_cannot_move() {
    let mut h = hearing();
    h.set_status(HearingStatus::Cancelled).unwrap();

    let err = h
      .reschedule(
        Reschedule {
          date:   "2024-06-20".into(),
          time:   "09:00".into(),
          reason: "x".into(),
        },
        "Clerk Kim",
        Utc::now(),
      )
      .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
    assert!(h.rescheduling_history.is_empty());

    assert!(matches!(
      h.set_status(HearingStatus::Completed),
      Err(Error::InvalidTransition { .. })
    ));
  }

  #[test]
  fn unparseable_stored_date_is_a_parse_error() {
    let mut h = hearing();
    h.date = "12/06/2024?".into();
    assert!(matches!(h.calendar_date(), Err(Error::Parse(_))));
  }
}
