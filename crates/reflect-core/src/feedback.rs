//! The one-shot feedback round attached to every entry.
//!
//! State only ever advances `NotRequested → Requested → Given`. The feedback
//! text itself is kept by a [`crate::store::FeedbackStore`]; the entry only
//! carries the state flag.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackState {
  #[default]
  NotRequested,
  Requested,
  Given,
}

impl FeedbackState {
  /// The only state this one may advance into.
  pub fn successor(self) -> Option<Self> {
    match self {
      Self::NotRequested => Some(Self::Requested),
      Self::Requested => Some(Self::Given),
      Self::Given => None,
    }
  }

  /// Advance to `next`, rejecting regressions, repeats and skips.
  pub fn advance(self, next: Self) -> Result<Self> {
    if self.successor() == Some(next) {
      Ok(next)
    } else {
      Err(Error::InvalidState { from: self, attempted: next })
    }
  }

  /// Author asks for feedback.
  pub fn request(self) -> Result<Self> { self.advance(Self::Requested) }

  /// Teacher answers a pending request.
  pub fn give(self) -> Result<Self> { self.advance(Self::Given) }

  pub fn is_given(self) -> bool { self == Self::Given }

  /// The discriminant string stored in the `feedback_state` column.
  pub fn discriminant(self) -> &'static str {
    match self {
      Self::NotRequested => "not_requested",
      Self::Requested => "requested",
      Self::Given => "given",
    }
  }

  pub fn from_discriminant(s: &str) -> Option<Self> {
    match s {
      "not_requested" => Some(Self::NotRequested),
      "requested" => Some(Self::Requested),
      "given" => Some(Self::Given),
      _ => None,
    }
  }
}

impl fmt::Display for FeedbackState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.discriminant())
  }
}

/// Feedback content written by a teacher for one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
  pub entry_id:   Uuid,
  pub teacher_id: Uuid,
  pub content:    String,
  pub given_at:   DateTime<Utc>,
}
