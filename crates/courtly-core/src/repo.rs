//! [`CourtRepository`]: typed access to the persisted court data.
//!
//! All state lives in a [`KvStore`] as JSON lists under the keys below. The
//! repository is the only writer: it loads a list, changes it and writes it
//! back. Within one process those read-modify-write cycles are serialised by
//! an internal lock; across processes the last write wins.

use chrono::{Local, TimeDelta, Utc};
use rand_core::OsRng;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

use crate::{
  Error, Result,
  case::{Case, CaseStatus, NewCase, Outcome, generate_case_number},
  hearing::{Hearing, HearingStatus, NewHearing, Reschedule},
  lifecycle::CaseRequest,
  message::{Message, NewMessage},
  reminder::{Reminder, upcoming},
  store::KvStore,
  user::{Actor, NewUser, PublicUser, Role, Session, User},
  visibility,
};

// ─── Keys ────────────────────────────────────────────────────────────────────

pub const CASES: &str = "cases";
pub const MESSAGES: &str = "messages";
pub const HEARINGS: &str = "hearings";
pub const CASE_REQUESTS: &str = "caseRequests";
pub const INITIALIZED: &str = "initialized";
pub const CURRENT_SESSION: &str = "currentSession";
pub const CURRENT_USER: &str = "currentUser";

/// How many case numbers to draw before giving up on finding a free one.
const CASE_NUMBER_ATTEMPTS: usize = 32;

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn require_role(actor: &Actor, allowed: &[Role], what: &str) -> Result<()> {
  if allowed.contains(&actor.role) {
    Ok(())
  } else {
    Err(Error::Forbidden(format!("a {} cannot {what}", actor.role)))
  }
}

fn not_found(entity: &'static str, id: Uuid) -> Error { Error::NotFound { entity, id } }

fn fresh_case_number(cases: &[Case]) -> Result<String> {
  for _ in 0..CASE_NUMBER_ATTEMPTS {
    let candidate = generate_case_number(&mut OsRng);
    if !cases.iter().any(|c| c.case_number == candidate) {
      return Ok(candidate);
    }
  }
  Err(Error::Validation("could not allocate a free case number".into()))
}

// ─── Repository ──────────────────────────────────────────────────────────────

/// The court-data service, injected with a storage backend.
pub struct CourtRepository<S> {
  store: S,
  write: tokio::sync::Mutex<()>,
}

impl<S: KvStore> CourtRepository<S> {
  pub fn new(store: S) -> Self {
    Self { store, write: tokio::sync::Mutex::new(()) }
  }

  pub fn store(&self) -> &S { &self.store }

  async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
    match self.store.get(key).await.map_err(Error::store)? {
      None | Some(Value::Null) => Ok(Vec::new()),
      Some(v) => Ok(serde_json::from_value(v)?),
    }
  }

  async fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
    let value = serde_json::to_value(items)?;
    self.store.set(key, value).await.map_err(Error::store)
  }

  /// Write empty lists for any missing key and set the `initialized` flag.
  ///
  /// Returns `false` if the store was already initialised.
  pub async fn initialize(&self) -> Result<bool> {
    let _guard = self.write.lock().await;
    if let Some(Value::Bool(true)) =
      self.store.get(INITIALIZED).await.map_err(Error::store)?
    {
      return Ok(false);
    }

    let lists = Role::ALL
      .into_iter()
      .map(Role::storage_key)
      .chain([CASES, MESSAGES, HEARINGS, CASE_REQUESTS]);
    for key in lists {
      if self.store.get(key).await.map_err(Error::store)?.is_none() {
        self.store.set(key, Value::Array(Vec::new())).await.map_err(Error::store)?;
      }
    }
    self.store.set(INITIALIZED, Value::Bool(true)).await.map_err(Error::store)?;
    tracing::info!("initialised court data store");
    Ok(true)
  }

  // ── Users ───────────────────────────────────────────────────────────────

  pub async fn register(&self, input: NewUser) -> Result<User> {
    let name = input.name.trim();
    let email = input.email.trim().to_lowercase();
    if name.is_empty() {
      return Err(Error::Validation("name is required".into()));
    }
    if !email.contains('@') {
      return Err(Error::Validation(format!("invalid email {email:?}")));
    }

    let _guard = self.write.lock().await;
    if self.find_user_by_email(&email).await?.is_some() {
      return Err(Error::Validation(format!("email {email} is already registered")));
    }

    let user = User {
      id:            Uuid::new_v4(),
      name:          name.to_owned(),
      email,
      password_hash: input.password_hash,
      created_at:    Utc::now(),
      profile:       input.profile,
    };
    let key = user.role().storage_key();
    let mut users: Vec<User> = self.load(key).await?;
    users.push(user.clone());
    self.save(key, &users).await?;

    tracing::info!(user_id = %user.id, role = %user.role(), "registered user");
    Ok(user)
  }

  pub async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
    let roles: &[Role] = match &role {
      Some(r) => std::slice::from_ref(r),
      None => &Role::ALL,
    };
    let mut out = Vec::new();
    for r in roles {
      out.extend(self.load::<User>(r.storage_key()).await?);
    }
    Ok(out)
  }

  pub async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    Ok(self.list_users(None).await?.into_iter().find(|u| u.id == id))
  }

  /// Case-insensitive lookup across all roles. Stored emails are already
  /// lowercased by [`Self::register`].
  pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    let email = email.trim().to_lowercase();
    Ok(self.list_users(None).await?.into_iter().find(|u| u.email == email))
  }

  async fn require_user(&self, id: Uuid, role: Role) -> Result<User> {
    match self.get_user(id).await? {
      Some(u) if u.role() == role => Ok(u),
      Some(_) => Err(Error::Validation(format!("user {id} is not a {role}"))),
      None => Err(not_found("user", id)),
    }
  }

  // ── Sessions ────────────────────────────────────────────────────────────

  /// Record `user` as the current session and user snapshot.
  pub async fn start_session(&self, user: &User) -> Result<Session> {
    let session = Session {
      user_id:    user.id,
      role:       user.role(),
      started_at: Utc::now(),
    };
    let _guard = self.write.lock().await;
    self
      .store
      .set(CURRENT_SESSION, serde_json::to_value(&session)?)
      .await
      .map_err(Error::store)?;
    self
      .store
      .set(CURRENT_USER, serde_json::to_value(PublicUser::from(user))?)
      .await
      .map_err(Error::store)?;
    tracing::info!(user_id = %user.id, "session started");
    Ok(session)
  }

  pub async fn current_session(&self) -> Result<Option<(Session, PublicUser)>> {
    let session = self.store.get(CURRENT_SESSION).await.map_err(Error::store)?;
    let user = self.store.get(CURRENT_USER).await.map_err(Error::store)?;
    match (session, user) {
      (Some(s), Some(u)) if !s.is_null() && !u.is_null() => {
        Ok(Some((serde_json::from_value(s)?, serde_json::from_value(u)?)))
      }
      _ => Ok(None),
    }
  }

  pub async fn end_session(&self) -> Result<()> {
    let _guard = self.write.lock().await;
    self.store.set(CURRENT_SESSION, Value::Null).await.map_err(Error::store)?;
    self.store.set(CURRENT_USER, Value::Null).await.map_err(Error::store)?;
    Ok(())
  }

  // ── Cases ───────────────────────────────────────────────────────────────

  pub async fn list_cases(&self) -> Result<Vec<Case>> { self.load(CASES).await }

  pub async fn get_case(&self, id: Uuid) -> Result<Option<Case>> {
    Ok(self.list_cases().await?.into_iter().find(|c| c.id == id))
  }

  /// Cases `actor` is party to; clerks get all of them.
  pub async fn cases_for(&self, actor: &Actor) -> Result<Vec<Case>> {
    let mut cases = self.list_cases().await?;
    cases.retain(|c| c.involves(actor));
    Ok(cases)
  }

  /// A client files a case directly; it starts out `pending`.
  pub async fn file_case(&self, actor: &Actor, input: NewCase) -> Result<Case> {
    require_role(actor, &[Role::Client], "file a case")?;
    if let Some(lawyer_id) = input.lawyer_id {
      self.require_user(lawyer_id, Role::Lawyer).await?;
    }

    let _guard = self.write.lock().await;
    let mut cases = self.list_cases().await?;
    let case = Case::file(input, actor.id, fresh_case_number(&cases)?, Utc::now())?;
    cases.push(case.clone());
    self.save(CASES, &cases).await?;

    tracing::info!(case_id = %case.id, case_number = %case.case_number, "case filed");
    Ok(case)
  }

  /// Load the case list, apply `f` to case `id` and write the list back.
  async fn modify_case<F>(&self, id: Uuid, f: F) -> Result<Case>
  where
    F: FnOnce(&mut Case) -> Result<()> + Send,
  {
    let _guard = self.write.lock().await;
    let mut cases = self.list_cases().await?;
    let case = cases.iter_mut().find(|c| c.id == id).ok_or(not_found("case", id))?;
    f(case)?;
    let updated = case.clone();
    self.save(CASES, &cases).await?;
    Ok(updated)
  }

  /// A clerk assigns `judge_id` to the case.
  pub async fn assign_judge(&self, actor: &Actor, case_id: Uuid, judge_id: Uuid) -> Result<Case> {
    require_role(actor, &[Role::Clerk], "assign judges")?;
    let judge = self.require_user(judge_id, Role::Judge).await?.actor();
    let case = self
      .modify_case(case_id, |c| c.assign_judge(&judge, Utc::now()))
      .await?;
    tracing::info!(case_id = %case.id, judge_id = %judge.id, "judge assigned");
    Ok(case)
  }

  /// Move a case forward (pending → active → in_progress).
  pub async fn update_case_status(
    &self,
    actor: &Actor,
    case_id: Uuid,
    next: CaseStatus,
  ) -> Result<Case> {
    require_role(actor, &[Role::Lawyer, Role::Clerk, Role::Judge], "change case status")?;
    let actor = actor.clone();
    self
      .modify_case(case_id, move |c| {
        if !c.involves(&actor) {
          return Err(Error::Forbidden(format!("not a party to case {}", c.case_number)));
        }
        c.advance(next, Utc::now())
      })
      .await
  }

  /// The case's judge records the final outcome.
  pub async fn issue_judgement(
    &self,
    actor: &Actor,
    case_id: Uuid,
    outcome: Outcome,
    text: String,
  ) -> Result<Case> {
    require_role(actor, &[Role::Judge], "issue judgements")?;
    let actor = actor.clone();
    let case = self
      .modify_case(case_id, move |c| {
        if !c.involves(&actor) {
          return Err(Error::Forbidden(format!("not the judge on case {}", c.case_number)));
        }
        c.issue_judgement(outcome, text, &actor, Utc::now())
      })
      .await?;
    tracing::info!(case_id = %case.id, status = %case.status, "judgement issued");
    Ok(case)
  }

  // ── Case requests ───────────────────────────────────────────────────────

  pub async fn list_requests(&self) -> Result<Vec<CaseRequest>> {
    self.load(CASE_REQUESTS).await
  }

  /// Requests sent by a client or addressed to a lawyer; clerks see all.
  pub async fn requests_for(&self, actor: &Actor) -> Result<Vec<CaseRequest>> {
    let mut requests = self.list_requests().await?;
    requests.retain(|r| match actor.role {
      Role::Client => r.client_id == actor.id,
      Role::Lawyer => r.lawyer_id == actor.id,
      Role::Clerk => true,
      Role::Judge => false,
    });
    Ok(requests)
  }

  pub async fn create_request(
    &self,
    actor: &Actor,
    lawyer_id: Uuid,
    case_title: &str,
    description: &str,
  ) -> Result<CaseRequest> {
    require_role(actor, &[Role::Client], "request representation")?;
    let request =
      CaseRequest::create(actor.id, lawyer_id, case_title, description, Utc::now())?;
    self.require_user(lawyer_id, Role::Lawyer).await?;

    let _guard = self.write.lock().await;
    let mut requests = self.list_requests().await?;
    requests.push(request.clone());
    self.save(CASE_REQUESTS, &requests).await?;

    tracing::info!(request_id = %request.id, lawyer_id = %lawyer_id, "case request created");
    Ok(request)
  }

  fn addressed_to<'r>(
    requests: &'r mut [CaseRequest],
    id: Uuid,
    actor: &Actor,
  ) -> Result<&'r mut CaseRequest> {
    require_role(actor, &[Role::Lawyer], "answer case requests")?;
    let request = requests
      .iter_mut()
      .find(|r| r.id == id)
      .ok_or(not_found("case request", id))?;
    if request.lawyer_id != actor.id {
      return Err(Error::Forbidden(format!("request {id} is addressed to another lawyer")));
    }
    Ok(request)
  }

  /// Accept a pending request, creating exactly one active case.
  ///
  /// The request and case lists are written in one batch.
  pub async fn accept_request(&self, actor: &Actor, id: Uuid) -> Result<(CaseRequest, Case)> {
    let _guard = self.write.lock().await;
    let mut requests = self.list_requests().await?;
    let mut cases = self.list_cases().await?;

    let request = Self::addressed_to(&mut requests, id, actor)?;
    let case = request.accept(fresh_case_number(&cases)?, Utc::now())?;
    let request = request.clone();

    cases.push(case.clone());
    self
      .store
      .set_many(vec![
        (CASE_REQUESTS, serde_json::to_value(&requests)?),
        (CASES, serde_json::to_value(&cases)?),
      ])
      .await
      .map_err(Error::store)?;

    tracing::info!(request_id = %id, case_id = %case.id, "case request accepted");
    Ok((request, case))
  }

  pub async fn reject_request(&self, actor: &Actor, id: Uuid) -> Result<CaseRequest> {
    let _guard = self.write.lock().await;
    let mut requests = self.list_requests().await?;

    let request = Self::addressed_to(&mut requests, id, actor)?;
    request.reject()?;
    let request = request.clone();
    self.save(CASE_REQUESTS, &requests).await?;

    tracing::info!(request_id = %id, "case request rejected");
    Ok(request)
  }

  // ── Hearings ────────────────────────────────────────────────────────────

  pub async fn list_hearings(&self) -> Result<Vec<Hearing>> { self.load(HEARINGS).await }

  pub async fn get_hearing(&self, id: Uuid) -> Result<Option<Hearing>> {
    Ok(self.list_hearings().await?.into_iter().find(|h| h.id == id))
  }

  /// Hearings on cases `actor` is party to; nothing without an actor.
  pub async fn visible_hearings(&self, actor: Option<&Actor>) -> Result<Vec<Hearing>> {
    let hearings = self.list_hearings().await?;
    let cases = self.list_cases().await?;
    Ok(
      visibility::visible_hearings(&hearings, &cases, actor)
        .into_iter()
        .cloned()
        .collect(),
    )
  }

  /// Reminders for `actor`'s hearings starting within `window` from now.
  pub async fn reminders(&self, actor: &Actor, window: TimeDelta) -> Result<Vec<Reminder>> {
    let hearings = self.visible_hearings(Some(actor)).await?;
    Ok(upcoming(&hearings, Local::now().naive_local(), window))
  }

  /// Clerks and the case's judge may schedule; the case must exist.
  pub async fn schedule_hearing(&self, actor: &Actor, input: NewHearing) -> Result<Hearing> {
    require_role(actor, &[Role::Clerk, Role::Judge], "schedule hearings")?;
    let case = self
      .get_case(input.case_id)
      .await?
      .ok_or(not_found("case", input.case_id))?;
    if !case.involves(actor) {
      return Err(Error::Forbidden(format!("not the judge on case {}", case.case_number)));
    }
    if case.status.is_terminal() {
      return Err(Error::Validation(format!("case {} is {}", case.case_number, case.status)));
    }
    let hearing = Hearing::schedule(input)?;

    let _guard = self.write.lock().await;
    let mut hearings = self.list_hearings().await?;
    hearings.push(hearing.clone());
    self.save(HEARINGS, &hearings).await?;

    tracing::info!(hearing_id = %hearing.id, case_id = %case.id, date = %hearing.date, "hearing scheduled");
    Ok(hearing)
  }

  async fn modify_hearing<F>(&self, actor: &Actor, id: Uuid, f: F) -> Result<Hearing>
  where
    F: FnOnce(&mut Hearing) -> Result<()> + Send,
  {
    require_role(actor, &[Role::Clerk, Role::Judge], "change hearings")?;
    let cases = self.list_cases().await?;

    let _guard = self.write.lock().await;
    let mut hearings = self.list_hearings().await?;
    let hearing = hearings.iter_mut().find(|h| h.id == id).ok_or(not_found("hearing", id))?;
    let allowed = match cases.iter().find(|c| c.id == hearing.case_id) {
      Some(case) => case.involves(actor),
      None => actor.role == Role::Clerk,
    };
    if !allowed {
      return Err(Error::Forbidden(format!("cannot change hearing {id}")));
    }
    f(hearing)?;
    let updated = hearing.clone();
    self.save(HEARINGS, &hearings).await?;
    Ok(updated)
  }

  pub async fn reschedule_hearing(
    &self,
    actor: &Actor,
    id: Uuid,
    to: Reschedule,
  ) -> Result<Hearing> {
    let changed_by = actor.name.clone();
    let hearing = self
      .modify_hearing(actor, id, move |h| {
        h.reschedule(to, &changed_by, Utc::now()).map(|_| ())
      })
      .await?;
    tracing::info!(hearing_id = %id, date = %hearing.date, time = %hearing.time, "hearing rescheduled");
    Ok(hearing)
  }

  pub async fn set_hearing_status(
    &self,
    actor: &Actor,
    id: Uuid,
    status: HearingStatus,
  ) -> Result<Hearing> {
    self.modify_hearing(actor, id, move |h| h.set_status(status)).await
  }

  // ── Messages ────────────────────────────────────────────────────────────

  pub async fn send_message(&self, actor: &Actor, input: NewMessage) -> Result<Message> {
    if input.body.trim().is_empty() {
      return Err(Error::Validation("message body is required".into()));
    }
    if self.get_user(input.recipient_id).await?.is_none() {
      return Err(not_found("user", input.recipient_id));
    }
    let message = Message {
      id:           Uuid::new_v4(),
      sender_id:    actor.id,
      recipient_id: input.recipient_id,
      case_id:      input.case_id,
      subject:      input.subject,
      body:         input.body,
      sent_at:      Utc::now(),
      read:         false,
    };

    let _guard = self.write.lock().await;
    let mut messages: Vec<Message> = self.load(MESSAGES).await?;
    messages.push(message.clone());
    self.save(MESSAGES, &messages).await?;
    Ok(message)
  }

  /// Messages received by `actor`, newest first.
  pub async fn inbox(&self, actor: &Actor) -> Result<Vec<Message>> {
    let mut messages: Vec<Message> = self.load(MESSAGES).await?;
    messages.retain(|m| m.recipient_id == actor.id);
    messages.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
    Ok(messages)
  }

  /// Messages sent by `actor`, newest first.
  pub async fn sent(&self, actor: &Actor) -> Result<Vec<Message>> {
    let mut messages: Vec<Message> = self.load(MESSAGES).await?;
    messages.retain(|m| m.sender_id == actor.id);
    messages.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
    Ok(messages)
  }

  pub async fn mark_read(&self, actor: &Actor, id: Uuid) -> Result<Message> {
    let _guard = self.write.lock().await;
    let mut messages: Vec<Message> = self.load(MESSAGES).await?;
    let message = messages
      .iter_mut()
      .find(|m| m.id == id && m.recipient_id == actor.id)
      .ok_or(not_found("message", id))?;
    message.read = true;
    let updated = message.clone();
    self.save(MESSAGES, &messages).await?;
    Ok(updated)
  }
}
