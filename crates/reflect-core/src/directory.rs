//! Identities and the classroom directory the engine consults.
//!
//! Classrooms and their rosters are managed elsewhere; the engine only asks
//! membership and role questions through [`ClassroomDirectory`].

use std::{fmt, future::Future, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Student,
  Teacher,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Student => "student",
      Self::Teacher => "teacher",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "student" => Ok(Self::Student),
      "teacher" => Ok(Self::Teacher),
      other => Err(format!("unknown role: {other:?}")),
    }
  }
}

/// The acting user behind a request, as resolved by the auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub user_id: Uuid,
  pub role:    Role,
}

impl Identity {
  pub fn student(user_id: Uuid) -> Self { Self { user_id, role: Role::Student } }

  pub fn teacher(user_id: Uuid) -> Self { Self { user_id, role: Role::Teacher } }
}

/// Membership and role lookups.
pub trait ClassroomDirectory: Send + Sync {
  fn classroom_exists(
    &self,
    classroom_id: Uuid,
  ) -> impl Future<Output = Result<bool>> + Send + '_;

  /// `true` if the user is enrolled in the classroom or teaches it.
  fn is_member(
    &self,
    classroom_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool>> + Send + '_;

  fn is_teacher(
    &self,
    classroom_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool>> + Send + '_;

  fn classrooms_taught_by(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Uuid>>> + Send + '_;

  /// The user's current role, or `None` for unknown users.
  fn role(&self, user_id: Uuid) -> impl Future<Output = Result<Option<Role>>> + Send + '_;
}
