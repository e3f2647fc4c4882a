//! Users, roles and sessions.
//!
//! A user is a common base record plus a role-specific payload. The role is
//! the payload's tag and never changes after registration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

// ─── Role ────────────────────────────────────────────────────────────────────

/// The four kinds of participant in the system.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Client,
  Lawyer,
  Clerk,
  Judge,
}

impl Role {
  pub const ALL: [Role; 4] =
    [Role::Client, Role::Lawyer, Role::Clerk, Role::Judge];

  /// The key of the persisted list holding users of this role.
  pub fn storage_key(self) -> &'static str {
    match self {
      Self::Client => "clients",
      Self::Lawyer => "lawyers",
      Self::Clerk => "clerks",
      Self::Judge => "judges",
    }
  }
}

// ─── Role payloads ───────────────────────────────────────────────────────────

/// Role-specific part of a user record. The variant tag doubles as the role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum RoleProfile {
  Client {
    #[serde(default)]
    phone:   Option<String>,
    #[serde(default)]
    address: Option<String>,
  },
  Lawyer {
    bar_number:     String,
    #[serde(default)]
    specialization: Option<String>,
  },
  Clerk {
    #[serde(default)]
    court: Option<String>,
  },
  Judge {
    #[serde(default)]
    court:   Option<String>,
    #[serde(default)]
    chamber: Option<String>,
  },
}

impl RoleProfile {
  pub fn role(&self) -> Role {
    match self {
      Self::Client { .. } => Role::Client,
      Self::Lawyer { .. } => Role::Lawyer,
      Self::Clerk { .. } => Role::Clerk,
      Self::Judge { .. } => Role::Judge,
    }
  }
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A registered user as persisted, including the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:            Uuid,
  pub name:          String,
  pub email:         String,
  /// PHC string produced by argon2.
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
  #[serde(flatten)]
  pub profile:       RoleProfile,
}

impl User {
  pub fn role(&self) -> Role { self.profile.role() }

  pub fn actor(&self) -> Actor {
    Actor {
      id:   self.id,
      name: self.name.clone(),
      role: self.role(),
    }
  }
}

/// Input to [`crate::repo::CourtRepository::register`]. The password is
/// already hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
  pub profile:       RoleProfile,
}

/// A user record safe to hand out: everything except the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
  pub id:         Uuid,
  pub name:       String,
  pub email:      String,
  pub created_at: DateTime<Utc>,
  #[serde(flatten)]
  pub profile:    RoleProfile,
}

impl From<&User> for PublicUser {
  fn from(u: &User) -> Self {
    Self {
      id:         u.id,
      name:       u.name.clone(),
      email:      u.email.clone(),
      created_at: u.created_at,
      profile:    u.profile.clone(),
    }
  }
}

// ─── Actor ───────────────────────────────────────────────────────────────────

/// The authenticated party performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub id:   Uuid,
  pub name: String,
  pub role: Role,
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// The "current session" record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
  pub user_id:    Uuid,
  pub role:       Role,
  pub started_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn profile_tag_is_the_role() {
    let user = User {
      id:            Uuid::new_v4(),
      name:          "Ada".into(),
      email:         "ada@example.com".into(),
      password_hash: "x".into(),
      created_at:    Utc::now(),
      profile:       RoleProfile::Lawyer {
        bar_number:     "B-1".into(),
        specialization: None,
      },
    };
    let json = serde_json::to_value(&user).unwrap();
    assert_eq!(json["role"], "lawyer");
    assert_eq!(json["barNumber"], "B-1");
    assert_eq!(json["passwordHash"], "x");

    let back: User = serde_json::from_value(json).unwrap();
    assert_eq!(back.role(), Role::Lawyer);
  }

  #[test]
  fn public_user_drops_the_hash() {
    let user = User {
      id:            Uuid::new_v4(),
      name:          "Cy".into(),
      email:         "cy@example.com".into(),
      password_hash: "secret-hash".into(),
      created_at:    Utc::now(),
      profile:       RoleProfile::Clerk { court: None },
    };
    let json = serde_json::to_value(PublicUser::from(&user)).unwrap();
    assert!(json.get("passwordHash").is_none());
    assert_eq!(json["role"], "clerk");
  }

  #[test]
  fn role_parses_from_lowercase() {
    assert_eq!("judge".parse::<Role>().unwrap(), Role::Judge);
    assert_eq!(Role::Client.storage_key(), "clients");
  }
}
