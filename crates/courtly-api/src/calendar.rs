//! Handlers for `/calendar` and `/reminders`.
//!
//! The calendar is stateless on the server: the client sends its current
//! mode and anchor (and optionally a navigation step) and receives the
//! resolved days with the caller's hearings bucketed onto them.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::{NaiveDate, TimeDelta};
use courtly_core::{
  calendar::{self, CalendarView, CustomRange, Direction, ViewMode},
  reminder::Reminder,
  repo::CourtRepository,
  store::KvStore,
  visibility::{DayBucket, bucketize},
};
use serde::{Deserialize, Serialize};

use crate::{auth::Authenticated, error::ApiError};

// ─── Calendar ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CalendarParams {
  /// Defaults to `week`.
  pub view:   Option<ViewMode>,
  /// Defaults to today; an unparseable anchor also falls back to today.
  pub anchor: Option<String>,
  /// Custom range bounds, used only when `view=custom`.
  pub start:  Option<String>,
  pub end:    Option<String>,
  /// Step the anchor once before resolving.
  pub dir:    Option<Direction>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarBody {
  pub view:           ViewMode,
  pub anchor:         NaiveDate,
  pub leading_blanks: u32,
  pub days:           Vec<DayBucket>,
}

/// `GET /calendar?view=&anchor=&start=&end=&dir=`
pub async fn handler<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
  Query(params): Query<CalendarParams>,
) -> Result<Json<CalendarBody>, ApiError>
where
  S: KvStore,
{
  let anchor = match params.anchor.as_deref() {
    Some(raw) => calendar::parse_calendar_date(raw).unwrap_or_else(|| {
      tracing::warn!(anchor = raw, "unparseable calendar anchor; using today");
      calendar::today()
    }),
    None => calendar::today(),
  };

  let mut view = CalendarView::new(params.view.unwrap_or_default(), anchor);
  if let (Some(start), Some(end)) = (params.start, params.end) {
    view = view.with_custom_range(CustomRange::new(start, end));
  }
  if let Some(dir) = params.dir {
    view.step(dir);
  }

  let days = view.days();
  let hearings = repo.visible_hearings(Some(&actor)).await?;
  Ok(Json(CalendarBody {
    view:           view.mode,
    anchor:         view.anchor,
    leading_blanks: view.leading_blanks(),
    days:           bucketize(&hearings, &days),
  }))
}

// ─── Reminders ────────────────────────────────────────────────────────────────

const DEFAULT_WINDOW_HOURS: u32 = 24;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderParams {
  pub within_hours: Option<u32>,
}

/// `GET /reminders[?withinHours=24]`
pub async fn reminders<S>(
  Authenticated(actor): Authenticated,
  State(repo): State<Arc<CourtRepository<S>>>,
  Query(params): Query<ReminderParams>,
) -> Result<Json<Vec<Reminder>>, ApiError>
where
  S: KvStore,
{
  let hours = params.within_hours.unwrap_or(DEFAULT_WINDOW_HOURS);
  let window = TimeDelta::hours(i64::from(hours));
  Ok(Json(repo.reminders(&actor, window).await?))
}
