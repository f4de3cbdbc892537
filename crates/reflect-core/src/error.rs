//! Error types for `reflect-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::feedback::FeedbackState;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field is missing or empty.
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("reflection entry not found: {0}")]
  EntryNotFound(Uuid),

  #[error("classroom not found: {0}")]
  ClassroomNotFound(Uuid),

  /// A visibility change that the state machine does not allow.
  #[error("invalid visibility transition: {0}")]
  InvalidTransition(String),

  /// A feedback transition that would break monotonicity.
  #[error("feedback cannot move from {from} to {attempted}")]
  InvalidState {
    from:      FeedbackState,
    attempted: FeedbackState,
  },

  /// Publish into a classroom the author does not belong to.
  #[error("author is not a member of classroom {0}")]
  InvalidClassroom(Uuid),

  /// The entry changed between authorization and the atomic apply.
  #[error("conflict: {0}")]
  Conflict(String),

  /// Opaque failure inside a storage backend or collaborator.
  #[error("backend error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn forbidden(msg: impl Into<String>) -> Self { Self::Forbidden(msg.into()) }

  pub fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }

  pub fn backend<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Backend(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
