//! Which hearings an actor may see, and which calendar day each falls on.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  case::Case,
  hearing::Hearing,
  user::{Actor, Role},
};

/// Filter `hearings` down to those on cases `actor` is party to.
///
/// Clerks see everything; without an actor nothing is visible. For other
/// roles a hearing whose case is missing is hidden.
pub fn visible_hearings<'a>(
  hearings: &'a [Hearing],
  cases: &[Case],
  actor: Option<&Actor>,
) -> Vec<&'a Hearing> {
  let Some(actor) = actor else {
    return Vec::new();
  };
  let by_id: HashMap<Uuid, &Case> = cases.iter().map(|c| (c.id, c)).collect();
  hearings
    .iter()
    .filter(|h| match by_id.get(&h.case_id) {
      Some(case) => case.involves(actor),
      None => actor.role == Role::Clerk,
    })
    .collect()
}

/// The hearings that fall on `day`, comparing calendar dates only.
///
/// Hearings with an unparseable date are logged and left out.
pub fn hearings_on_day<'a>(
  hearings: impl IntoIterator<Item = &'a Hearing>,
  day: NaiveDate,
) -> Vec<&'a Hearing> {
  hearings
    .into_iter()
    .filter(|h| match h.calendar_date() {
      Ok(date) => date == day,
      Err(e) => {
        tracing::warn!(hearing_id = %h.id, error = %e, "dropping hearing");
        false
      }
    })
    .collect()
}

/// One calendar cell and the hearings on it.
#[derive(Debug, Clone, Serialize)]
pub struct DayBucket {
  pub date:     NaiveDate,
  pub hearings: Vec<Hearing>,
}

/// Group hearings into one bucket per day of `days`, each ordered by time.
///
/// Every day gets a bucket, empty or not; hearings outside `days` are
/// ignored and unparseable ones are logged and dropped.
pub fn bucketize<'a>(
  hearings: impl IntoIterator<Item = &'a Hearing>,
  days: &[NaiveDate],
) -> Vec<DayBucket> {
  let mut by_day: BTreeMap<NaiveDate, Vec<&Hearing>> = BTreeMap::new();
  for h in hearings {
    match h.calendar_date() {
      Ok(date) => by_day.entry(date).or_default().push(h),
      Err(e) => {
        tracing::warn!(hearing_id = %h.id, error = %e, "dropping hearing");
      }
    }
  }

  days
    .iter()
    .map(|&date| {
      let mut on_day: Vec<Hearing> = by_day
        .get(&date)
        .map(|hs| hs.iter().map(|h| (*h).clone()).collect())
        .unwrap_or_default();
      on_day.sort_by(|a, b| a.time.cmp(&b.time));
      DayBucket { date, hearings: on_day }
    })
    .collect()
}
