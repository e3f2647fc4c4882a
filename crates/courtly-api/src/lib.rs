//! JSON REST API for Courtly.
//!
//! Exposes an axum [`Router`] backed by a [`CourtRepository`] over any
//! [`KvStore`]. Requests authenticate with HTTP Basic (`email:password`);
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", courtly_api::api_router(repo.clone()))
//! ```

pub mod auth;
pub mod calendar;
pub mod cases;
pub mod error;
pub mod hearings;
pub mod messages;
pub mod requests;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use courtly_core::{repo::CourtRepository, store::KvStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `repo`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(repo: Arc<CourtRepository<S>>) -> Router<()>
where
  S: KvStore + 'static,
{
  Router::new()
    // Users and session
    .route("/users", get(users::list::<S>).post(users::register::<S>))
    .route(
      "/session",
      get(users::current::<S>)
        .post(users::login::<S>)
        .delete(users::logout::<S>),
    )
    // Cases
    .route("/cases", get(cases::list::<S>).post(cases::create::<S>))
    .route("/cases/{id}", get(cases::get_one::<S>))
    .route("/cases/{id}/judge", post(cases::assign_judge::<S>))
    .route("/cases/{id}/status", post(cases::update_status::<S>))
    .route("/cases/{id}/judgement", post(cases::judgement::<S>))
    // Case requests
    .route("/case-requests", get(requests::list::<S>).post(requests::create::<S>))
    .route("/case-requests/{id}/accept", post(requests::accept::<S>))
    .route("/case-requests/{id}/reject", post(requests::reject::<S>))
    // Hearings
    .route("/hearings", get(hearings::list::<S>).post(hearings::create::<S>))
    .route("/hearings/{id}", get(hearings::get_one::<S>))
    .route("/hearings/{id}/reschedule", post(hearings::reschedule::<S>))
    .route("/hearings/{id}/status", post(hearings::update_status::<S>))
    // Calendar and reminders
    .route("/calendar", get(calendar::handler::<S>))
    .route("/reminders", get(calendar::reminders::<S>))
    // Messages
    .route("/messages", get(messages::list::<S>).post(messages::send::<S>))
    .route("/messages/{id}/read", post(messages::mark_read::<S>))
    .with_state(repo)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use courtly_core::store::MemoryStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  const PASSWORD: &str = "hunter22";

  fn app() -> Router {
    api_router(Arc::new(CourtRepository::new(MemoryStore::new())))
  }

  fn auth_header(email: &str) -> String {
    format!("Basic {}", B64.encode(format!("{email}:{PASSWORD}")))
  }

  async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(email) = auth {
      builder = builder.header(header::AUTHORIZATION, auth_header(email));
    }
    let req = match body {
      Some(b) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(b.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn register(app: &Router, email: &str, profile: Value) -> Value {
    let mut body = json!({ "name": email, "email": email, "password": PASSWORD });
    let (Value::Object(b), Value::Object(p)) = (&mut body, profile) else {
      unreachable!()
    };
    b.extend(p);
    let (status, user) = call(app, "POST", "/users", None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{user}");
    user
  }

  async fn client(app: &Router, email: &str) -> Value {
    register(app, email, json!({ "role": "client", "phone": "555-0100" })).await
  }

  async fn lawyer(app: &Router, email: &str) -> Value {
    register(app, email, json!({ "role": "lawyer", "barNumber": "B-1" })).await
  }

  async fn clerk(app: &Router, email: &str) -> Value {
    register(app, email, json!({ "role": "clerk", "court": "District" })).await
  }

  #[tokio::test]
  async fn registration_hides_password_hash() {
    let app = app();
    let user = lawyer(&app, "Lee@Example.com").await;
    assert_eq!(user["role"], "lawyer");
    assert_eq!(user["barNumber"], "B-1");
    assert_eq!(user["email"], "lee@example.com");
    assert!(user.get("passwordHash").is_none());

    let (status, _) = call(
      &app,
      "POST",
      "/users",
      None,
      Some(json!({
        "name": "Other", "email": "lee@example.com", "password": "x",
        "role": "client"
      })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn session_lifecycle() {
    let app = app();
    client(&app, "cat@example.com").await;

    let (status, _) = call(&app, "GET", "/session", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let login = json!({ "email": "cat@example.com", "password": PASSWORD });
    let (status, body) = call(&app, "POST", "/session", None, Some(login)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["role"], "client");
    assert_eq!(body["user"]["email"], "cat@example.com");

    let (status, body) = call(&app, "GET", "/session", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "cat@example.com");

    let (status, _) = call(&app, "DELETE", "/session", None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "GET", "/session", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let bad = json!({ "email": "cat@example.com", "password": "nope" });
    let (status, _) = call(&app, "POST", "/session", None, Some(bad)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn missing_credentials_are_challenged() {
    let app = app();
    let req = Request::builder().uri("/cases").body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

    let (status, _) = call(&app, "GET", "/cases", Some("ghost@example.com"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn representation_request_workflow() {
    let app = app();
    client(&app, "cat@example.com").await;
    let lee = lawyer(&app, "lee@example.com").await;

    let (status, request) = call(
      &app,
      "POST",
      "/case-requests",
      Some("cat@example.com"),
      Some(json!({ "lawyerId": lee["id"], "caseTitle": "Lease dispute" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "pending");
    let id = request["id"].as_str().unwrap().to_owned();

    let (_, inbox) = call(&app, "GET", "/case-requests", Some("lee@example.com"), None).await;
    assert_eq!(inbox.as_array().unwrap().len(), 1);

    let accept = format!("/case-requests/{id}/accept");
    let (status, _) = call(&app, "POST", &accept, Some("cat@example.com"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&app, "POST", &accept, Some("lee@example.com"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["request"]["status"], "accepted");
    assert_eq!(body["case"]["status"], "active");
    assert_eq!(body["case"]["lawyerId"], lee["id"]);
    assert!(body["case"]["caseNumber"].as_str().unwrap().starts_with("C-"));

    let (status, _) = call(&app, "POST", &accept, Some("lee@example.com"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let reject = format!("/case-requests/{id}/reject");
    let (status, _) = call(&app, "POST", &reject, Some("lee@example.com"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, cases) = call(&app, "GET", "/cases", Some("cat@example.com"), None).await;
    assert_eq!(cases.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn role_checks_are_enforced() {
    let app = app();
    clerk(&app, "kim@example.com").await;
    let (status, body) = call(
      &app,
      "POST",
      "/cases",
      Some("kim@example.com"),
      Some(json!({ "title": "Not mine to file" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
  }

  /// A client files a case and a clerk schedules a hearing on it.
  async fn scheduled_hearing(app: &Router) -> Value {
    client(app, "cat@example.com").await;
    clerk(app, "kim@example.com").await;
    let (status, case) = call(
      app,
      "POST",
      "/cases",
      Some("cat@example.com"),
      Some(json!({ "title": "Boundary wall" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(case["status"], "pending");

    let (status, hearing) = call(
      app,
      "POST",
      "/hearings",
      Some("kim@example.com"),
      Some(json!({
        "caseId": case["id"], "date": "2024-06-12", "time": "10:30",
        "location": "Room 4"
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{hearing}");
    hearing
  }

  #[tokio::test]
  async fn week_calendar_buckets_visible_hearings() {
    let app = app();
    scheduled_hearing(&app).await;
    lawyer(&app, "lee@example.com").await;

    let uri = "/calendar?view=week&anchor=2024-06-12";
    let (status, body) = call(&app, "GET", uri, Some("cat@example.com"), None).await;
    assert_eq!(status, StatusCode::OK);
    let days = body["days"].as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[0]["date"], "2024-06-10");
    assert_eq!(days[2]["date"], "2024-06-12");
    assert_eq!(days[2]["hearings"].as_array().unwrap().len(), 1);
    assert_eq!(body["leadingBlanks"], 0);

    let (_, body) = call(&app, "GET", uri, Some("lee@example.com"), None).await;
    let total: usize = body["days"]
      .as_array()
      .unwrap()
      .iter()
      .map(|d| d["hearings"].as_array().unwrap().len())
      .sum();
    assert_eq!(total, 0);
  }

  #[tokio::test]
  async fn calendar_navigation_and_fallbacks() {
    let app = app();
    client(&app, "cat@example.com").await;

    let uri = "/calendar?view=month&anchor=2024-01-31&dir=next";
    let (_, body) = call(&app, "GET", uri, Some("cat@example.com"), None).await;
    assert_eq!(body["anchor"], "2024-02-29");
    assert_eq!(body["days"].as_array().unwrap().len(), 29);
    assert_eq!(body["leadingBlanks"], 3);

    let uri = "/calendar?view=custom&anchor=2024-06-12&start=2024-06-20&end=2024-06-10";
    let (status, body) = call(&app, "GET", uri, Some("cat@example.com"), None).await;
    assert_eq!(status, StatusCode::OK);
    let days = body["days"].as_array().unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0]["date"], "2024-06-12");

    let uri = "/calendar?view=custom&anchor=2024-06-12&start=2024-06-10&end=2024-06-13";
    let (_, body) = call(&app, "GET", uri, Some("cat@example.com"), None).await;
    assert_eq!(body["days"].as_array().unwrap().len(), 4);
  }

  #[tokio::test]
  async fn unparseable_anchor_shows_this_week() {
    let app = app();
    client(&app, "cat@example.com").await;

    let uri = "/calendar?view=week&anchor=garbage";
    let (status, body) = call(&app, "GET", uri, Some("cat@example.com"), None).await;
    assert_eq!(status, StatusCode::OK);
    let today = courtly_core::calendar::today();
    assert_eq!(body["anchor"], today.to_string());
    let days = body["days"].as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[0]["date"], courtly_core::calendar::week_start(today).to_string());
  }

  #[tokio::test]
  async fn oversized_custom_range_shows_the_anchor_day() {
    let app = app();
    client(&app, "cat@example.com").await;

    let uri = "/calendar?view=custom&anchor=2024-06-12&start=0001-01-01&end=9999-12-31";
    let (status, body) = call(&app, "GET", uri, Some("cat@example.com"), None).await;
    assert_eq!(status, StatusCode::OK);
    let days = body["days"].as_array().unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0]["date"], "2024-06-12");
  }

  #[tokio::test]
  async fn cases_and_hearings_are_hidden_from_non_parties() {
    let app = app();
    let hearing = scheduled_hearing(&app).await;
    client(&app, "oda@example.com").await;

    let case_uri = format!("/cases/{}", hearing["caseId"].as_str().unwrap());
    let (status, _) = call(&app, "GET", &case_uri, Some("cat@example.com"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, "GET", &case_uri, Some("oda@example.com"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let hearing_uri = format!("/hearings/{}", hearing["id"].as_str().unwrap());
    let (status, _) = call(&app, "GET", &hearing_uri, Some("oda@example.com"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn reminders_honour_the_window() {
    let app = app();
    client(&app, "cat@example.com").await;
    clerk(&app, "kim@example.com").await;
    let (_, case) = call(
      &app,
      "POST",
      "/cases",
      Some("cat@example.com"),
      Some(json!({ "title": "Fence line" })),
    )
    .await;

    let now = chrono::Local::now().naive_local();
    for offset in [chrono::TimeDelta::hours(2), chrono::TimeDelta::days(3)] {
      let at = now + offset;
      let (status, _) = call(
        &app,
        "POST",
        "/hearings",
        Some("kim@example.com"),
        Some(json!({
          "caseId": case["id"],
          "date": at.format("%Y-%m-%d").to_string(),
          "time": at.format("%H:%M").to_string(),
        })),
      )
      .await;
      assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = call(&app, "GET", "/reminders", Some("cat@example.com"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["caseId"], case["id"]);

    let uri = format!("/reminders?withinHours={}", u32::MAX);
    let (status, body) = call(&app, "GET", &uri, Some("cat@example.com"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn rescheduling_records_history() {
    let app = app();
    let hearing = scheduled_hearing(&app).await;
    let id = hearing["id"].as_str().unwrap();

    let (status, moved) = call(
      &app,
      "POST",
      &format!("/hearings/{id}/reschedule"),
      Some("kim@example.com"),
      Some(json!({ "date": "2024-06-14", "time": "09:00", "reason": "Judge unavailable" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{moved}");
    assert_eq!(moved["rescheduled"], true);
    assert_eq!(moved["reschedulingHistory"][0]["previousDate"], "2024-06-12");
    assert_eq!(moved["reschedulingHistory"][0]["reason"], "Judge unavailable");

    let (status, _) = call(
      &app,
      "POST",
      &format!("/hearings/{id}/status"),
      Some("cat@example.com"),
      Some(json!({ "status": "cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn messages_flow_between_users() {
    let app = app();
    client(&app, "cat@example.com").await;
    let lee = lawyer(&app, "lee@example.com").await;

    let (status, sent) = call(
      &app,
      "POST",
      "/messages",
      Some("cat@example.com"),
      Some(json!({ "recipientId": lee["id"], "subject": "Hi", "body": "Can we talk?" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["read"], false);

    let (_, inbox) = call(&app, "GET", "/messages", Some("lee@example.com"), None).await;
    assert_eq!(inbox.as_array().unwrap().len(), 1);
    let (_, outbox) =
      call(&app, "GET", "/messages?box=sent", Some("cat@example.com"), None).await;
    assert_eq!(outbox.as_array().unwrap().len(), 1);

    let read = format!("/messages/{}/read", sent["id"].as_str().unwrap());
    let (status, _) = call(&app, "POST", &read, Some("cat@example.com"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, msg) = call(&app, "POST", &read, Some("lee@example.com"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(msg["read"], true);
  }
}
