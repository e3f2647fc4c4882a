//! Upcoming-hearing reminders, as polled by the notification side.

use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;
use uuid::Uuid;

use crate::hearing::{Hearing, HearingStatus, parse_time};

/// The subset of a hearing a reminder consumer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
  pub id:        Uuid,
  pub case_id:   Uuid,
  pub date:      String,
  pub time:      String,
  pub starts_at: NaiveDateTime,
}

/// Scheduled hearings starting within `window` of `now`, soonest first.
///
/// Times are wall-clock; `now` must be in the same local frame. Hearings
/// whose date or time does not parse are logged and skipped. A window
/// reaching past the representable range ends at [`NaiveDateTime::MAX`].
pub fn upcoming<'a>(
  hearings: impl IntoIterator<Item = &'a Hearing>,
  now: NaiveDateTime,
  window: TimeDelta,
) -> Vec<Reminder> {
  let until = now.checked_add_signed(window).unwrap_or(NaiveDateTime::MAX);
  let mut out: Vec<Reminder> = hearings
    .into_iter()
    .filter(|h| h.status == HearingStatus::Scheduled)
    .filter_map(|h| {
      let date = match h.calendar_date() {
        Ok(d) => d,
        Err(e) => {
          tracing::warn!(hearing_id = %h.id, error = %e, "skipping reminder");
          return None;
        }
      };
      let Some(time) = parse_time(&h.time) else {
        tracing::warn!(hearing_id = %h.id, time = %h.time, "skipping reminder");
        return None;
      };
      let starts_at = date.and_time(time);
      (now <= starts_at && starts_at <= until).then(|| Reminder {
        id: h.id,
        case_id: h.case_id,
        date: h.date.clone(),
        time: h.time.clone(),
        starts_at,
      })
    })
    .collect();
  out.sort_by_key(|r| r.starts_at);
  out
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::hearing::NewHearing;

  fn at(date: &str, time: &str) -> Hearing {
    Hearing::schedule(NewHearing {
      case_id:     Uuid::new_v4(),
      date:        date.into(),
      time:        time.into(),
      location:    String::new(),
      description: String::new(),
      notes:       None,
    })
    .unwrap()
  }

  fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 12)
      .unwrap()
      .and_hms_opt(12, 0, 0)
      .unwrap()
  }

  #[test]
  fn window_bounds_are_inclusive_and_sorted() {
    let hearings = vec![
      at("2024-06-13", "12:00"),
      at("2024-06-12", "11:59"),
      at("2024-06-12", "12:00"),
      at("2024-06-13", "12:01"),
      at("2024-06-12", "16:30"),
    ];
    let got = upcoming(&hearings, now(), TimeDelta::hours(24));
    let times: Vec<(&str, &str)> =
      got.iter().map(|r| (r.date.as_str(), r.time.as_str())).collect();
    assert_eq!(times, vec![
      ("2024-06-12", "12:00"),
      ("2024-06-12", "16:30"),
      ("2024-06-13", "12:00"),
    ]);
  }

  #[test]
  fn huge_window_does_not_overflow() {
    let hearings = vec![at("2024-06-12", "11:00"), at("9999-12-31", "23:59")];
    let got = upcoming(&hearings, now(), TimeDelta::hours(i64::from(u32::MAX)));
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].date, "9999-12-31");
  }

  #[test]
  fn skips_closed_and_broken_hearings() {
    let mut cancelled = at("2024-06-12", "13:00");
    cancelled.status = HearingStatus::Cancelled;
    let mut bad_time = at("2024-06-12", "13:00");
    bad_time.time = "after lunch".into();
    let mut bad_date = at("2024-06-12", "13:00");
    bad_date.date = "tbd".into();

    let hearings = vec![cancelled, bad_time, bad_date, at("2024-06-12", "14:00")];
    let got = upcoming(&hearings, now(), TimeDelta::hours(2));
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].time, "14:00");
  }
}
