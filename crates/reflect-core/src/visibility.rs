//! The visibility state machine.
//!
//! An entry is either private to its author or published into exactly one
//! classroom, attributed or anonymous. The classroom reference lives inside the
//! published variants, so "private with a classroom" and "public without a
//! classroom" cannot be represented at all.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Visibility {
  #[default]
  Private,
  PublicAttributed {
    classroom_id: Uuid,
  },
  PublicAnonymous {
    classroom_id: Uuid,
  },
}

impl Visibility {
  /// Build a published state for `classroom_id`.
  pub fn published(classroom_id: Uuid, anonymous: bool) -> Self {
    if anonymous {
      Self::PublicAnonymous { classroom_id }
    } else {
      Self::PublicAttributed { classroom_id }
    }
  }

  /// The classroom the entry is published into, if any.
  pub fn classroom_id(&self) -> Option<Uuid> {
    match self {
      Self::Private => None,
      Self::PublicAttributed { classroom_id }
      | Self::PublicAnonymous { classroom_id } => Some(*classroom_id),
    }
  }

  pub fn is_published(&self) -> bool { !matches!(self, Self::Private) }

  pub fn is_anonymous(&self) -> bool {
    matches!(self, Self::PublicAnonymous { .. })
  }

  /// The discriminant string stored in the `visibility` column.
  pub fn discriminant(&self) -> &'static str {
    match self {
      Self::Private => "private",
      Self::PublicAttributed { .. } => "public_attributed",
      Self::PublicAnonymous { .. } => "public_anonymous",
    }
  }

  /// Rebuild a state from its stored discriminant and classroom column.
  ///
  /// Returns `None` for rows where the two disagree.
  pub fn from_parts(discriminant: &str, classroom_id: Option<Uuid>) -> Option<Self> {
    match (discriminant, classroom_id) {
      ("private", None) => Some(Self::Private),
      ("public_attributed", Some(c)) => Some(Self::published(c, false)),
      ("public_anonymous", Some(c)) => Some(Self::published(c, true)),
      _ => None,
    }
  }
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// An author's requested visibility, in the shape the edit form submits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct VisibilityRequest {
  pub public:       bool,
  #[serde(default)]
  pub anonymous:    bool,
  /// Target classroom. May be omitted when the entry is already published and
  /// only the anonymity flag changes.
  pub classroom_id: Option<Uuid>,
}

impl VisibilityRequest {
  pub fn private() -> Self { Self::default() }

  pub fn publish(classroom_id: Uuid, anonymous: bool) -> Self {
    Self { public: true, anonymous, classroom_id: Some(classroom_id) }
  }

  /// Flip anonymity on an already-published entry, keeping its classroom.
  pub fn anonymity(anonymous: bool) -> Self {
    Self { public: true, anonymous, classroom_id: None }
  }

  /// The classroom whose membership must be verified before this request is
  /// applied.
  pub fn membership_target(&self) -> Option<Uuid> {
    if self.public { self.classroom_id } else { None }
  }
}

// ─── Transitions ─────────────────────────────────────────────────────────────

/// Compute the state that `request` moves `current` into.
///
/// Membership of the target classroom is checked by the caller; this function
/// only enforces the shape of the transition.
pub fn transition(
  current: &Visibility,
  request: &VisibilityRequest,
) -> Result<Visibility> {
  if !request.public {
    return Ok(Visibility::Private);
  }

  let classroom_id = request
    .classroom_id
    .or_else(|| current.classroom_id())
    .ok_or_else(|| {
      Error::InvalidTransition("publishing requires a classroom".to_owned())
    })?;

  Ok(Visibility::published(classroom_id, request.anonymous))
}
