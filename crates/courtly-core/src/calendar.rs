//! Calendar view derivation: which days a view shows and how the anchor date
//! moves.
//!
//! Nothing here returns an error to the caller. Bad input (an unparseable or
//! inverted custom range) is logged and the view falls back to the anchor day
//! alone, so a calendar can always be rendered.

use chrono::{
  DateTime, Datelike, Days, Local, Months, NaiveDate, NaiveDateTime,
};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

// ─── Modes ───────────────────────────────────────────────────────────────────

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
pub enum ViewMode {
  Day,
  #[default]
  Week,
  Month,
  Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  Prev,
  Next,
}

/// Longest custom range, in days, that a view will render.
pub const MAX_CUSTOM_DAYS: i64 = 366;

/// Inclusive bounds of a custom view, as typed into the range fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRange {
  pub start: String,
  pub end:   String,
}

impl CustomRange {
  pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
    Self { start: start.into(), end: end.into() }
  }

  /// Parse both bounds, requiring `start <= end` and a span of at most
  /// [`MAX_CUSTOM_DAYS`].
  pub fn parse(&self) -> Result<(NaiveDate, NaiveDate)> {
    let start = parse_calendar_date(&self.start).ok_or_else(|| {
      Error::InvalidRange(format!("start {:?} is not a date", self.start))
    })?;
    let end = parse_calendar_date(&self.end).ok_or_else(|| {
      Error::InvalidRange(format!("end {:?} is not a date", self.end))
    })?;
    if start > end {
      return Err(Error::InvalidRange(format!("start {start} is after end {end}")));
    }
    let span = (end - start).num_days() + 1;
    if span > MAX_CUSTOM_DAYS {
      return Err(Error::InvalidRange(format!(
        "{span} days from {start} to {end} exceeds {MAX_CUSTOM_DAYS}"
      )));
    }
    Ok((start, end))
  }
}

// ─── Date parsing ────────────────────────────────────────────────────────────

/// Parse the calendar date of a stored date field, ignoring any time part.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive `YYYY-MM-DDTHH:MM[:SS]`
/// timestamps.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
    return Some(d);
  }
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(dt.date_naive());
  }
  [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
  ]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .map(|dt| dt.date())
}

// ─── Day sequences ───────────────────────────────────────────────────────────

fn first_of_month(anchor: NaiveDate) -> NaiveDate {
  NaiveDate::from_ymd_opt(anchor.year(), anchor.month(), 1).unwrap_or(anchor)
}

/// The Monday on or before `anchor`.
pub fn week_start(anchor: NaiveDate) -> NaiveDate {
  let back = u64::from(anchor.weekday().num_days_from_monday());
  anchor.checked_sub_days(Days::new(back)).unwrap_or(anchor)
}

/// Number of blank cells before the 1st in a Monday-first month grid.
pub fn leading_blanks(anchor: NaiveDate) -> u32 {
  first_of_month(anchor).weekday().number_from_monday() - 1
}

fn days_through(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
  start.iter_days().take_while(|d| *d <= end).collect()
}

/// The ordered, non-empty sequence of days a view renders.
pub fn resolve_days(
  mode: ViewMode,
  anchor: NaiveDate,
  custom: Option<&CustomRange>,
) -> Vec<NaiveDate> {
  match mode {
    ViewMode::Day => vec![anchor],
    ViewMode::Week => week_start(anchor).iter_days().take(7).collect(),
    ViewMode::Month => {
      let first = first_of_month(anchor);
      first
        .iter_days()
        .take_while(|d| d.month() == first.month())
        .collect()
    }
    ViewMode::Custom => {
      let parsed = custom
        .ok_or_else(|| Error::InvalidRange("no custom range given".into()))
        .and_then(CustomRange::parse);
      match parsed {
        Ok((start, end)) => days_through(start, end),
        Err(e) => {
          tracing::warn!(error = %e, %anchor, "falling back to the anchor day");
          vec![anchor]
        }
      }
    }
  }
}

// ─── Navigation ──────────────────────────────────────────────────────────────

/// Step the anchor by one unit of the view's granularity.
///
/// Month steps keep the day of month, clamped to the target month's last
/// day: 2024-01-31 → 2024-02-29. Custom views do not move.
pub fn advance(anchor: NaiveDate, mode: ViewMode, direction: Direction) -> NaiveDate {
  let moved = match (mode, direction) {
    (ViewMode::Day, Direction::Next) => anchor.checked_add_days(Days::new(1)),
    (ViewMode::Day, Direction::Prev) => anchor.checked_sub_days(Days::new(1)),
    (ViewMode::Week, Direction::Next) => anchor.checked_add_days(Days::new(7)),
    (ViewMode::Week, Direction::Prev) => anchor.checked_sub_days(Days::new(7)),
    (ViewMode::Month, Direction::Next) => anchor.checked_add_months(Months::new(1)),
    (ViewMode::Month, Direction::Prev) => anchor.checked_sub_months(Months::new(1)),
    (ViewMode::Custom, _) => None,
  };
  moved.unwrap_or(anchor)
}

/// The current local date.
pub fn today() -> NaiveDate { Local::now().date_naive() }

// ─── View state ──────────────────────────────────────────────────────────────

/// Navigation state of one calendar: mode, anchor and optional custom range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarView {
  pub mode:         ViewMode,
  pub anchor:       NaiveDate,
  #[serde(default)]
  pub custom_range: Option<CustomRange>,
}

impl CalendarView {
  pub fn new(mode: ViewMode, anchor: NaiveDate) -> Self {
    Self { mode, anchor, custom_range: None }
  }

  pub fn with_custom_range(mut self, range: CustomRange) -> Self {
    self.custom_range = Some(range);
    self
  }

  pub fn days(&self) -> Vec<NaiveDate> {
    resolve_days(self.mode, self.anchor, self.custom_range.as_ref())
  }

  /// Leading grid blanks; only month views have any.
  pub fn leading_blanks(&self) -> u32 {
    match self.mode {
      ViewMode::Month => leading_blanks(self.anchor),
      _ => 0,
    }
  }

  pub fn step(&mut self, direction: Direction) {
    self.anchor = advance(self.anchor, self.mode, direction);
  }

  /// Jump back to `today`, whatever the mode.
  pub fn reset_to(&mut self, today: NaiveDate) { self.anchor = today; }
}
