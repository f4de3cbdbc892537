//! The reflection entry aggregate and its write inputs.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result, assets::PhotoRef, feedback::FeedbackState,
  visibility::{Visibility, VisibilityRequest},
};

// ─── Entry ───────────────────────────────────────────────────────────────────

/// A single reflection written by one author.
///
/// The like count is never stored; it is always the cardinality of
/// `liked_by`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionEntry {
  pub entry_id:       Uuid,
  pub author_id:      Uuid,
  pub title:          String,
  pub body:           String,
  pub photo_ref:      Option<PhotoRef>,
  pub visibility:     Visibility,
  pub feedback_state: FeedbackState,
  pub liked_by:       BTreeSet<Uuid>,
  pub created_at:     DateTime<Utc>,
  /// Set by the store on every successful mutation.
  pub updated_at:     DateTime<Utc>,
}

impl ReflectionEntry {
  pub fn like_count(&self) -> usize { self.liked_by.len() }

  pub fn is_author(&self, user_id: Uuid) -> bool { self.author_id == user_id }

  /// Check a mutated copy against the version it was derived from.
  ///
  /// Identity fields are immutable and text fields must stay non-blank.
  pub fn check_update_from(&self, before: &ReflectionEntry) -> Result<()> {
    if self.entry_id != before.entry_id
      || self.author_id != before.author_id
      || self.created_at != before.created_at
    {
      return Err(Error::validation("entry id, author and creation time are immutable"));
    }
    require_text("title", &self.title)?;
    require_text("body", &self.body)?;
    Ok(())
  }
}

/// Both sides of one atomic mutation.
#[derive(Debug, Clone)]
pub struct EntryChange {
  pub before: ReflectionEntry,
  pub after:  ReflectionEntry,
}

impl EntryChange {
  /// The photo that the mutation detached from the entry, if any.
  pub fn detached_photo(&self) -> Option<&PhotoRef> {
    match (&self.before.photo_ref, &self.after.photo_ref) {
      (Some(old), Some(new)) if old == new => None,
      (old, _) => old.as_ref(),
    }
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::EntryStore::insert_entry`]. The id, timestamps and
/// initial lifecycle state are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewEntry {
  pub author_id: Uuid,
  pub title:     String,
  pub body:      String,
  pub photo_ref: Option<PhotoRef>,
}

impl NewEntry {
  /// Validate and build an entry draft.
  pub fn new(author_id: Uuid, title: String, body: String) -> Result<Self> {
    require_text("title", &title)?;
    require_text("body", &body)?;
    Ok(Self { author_id, title, body, photo_ref: None })
  }

  /// Materialise the draft with store-assigned identity and timestamps.
  pub fn into_entry(self, entry_id: Uuid, now: DateTime<Utc>) -> ReflectionEntry {
    ReflectionEntry {
      entry_id,
      author_id: self.author_id,
      title: self.title,
      body: self.body,
      photo_ref: self.photo_ref,
      visibility: Visibility::Private,
      feedback_state: FeedbackState::NotRequested,
      liked_by: BTreeSet::new(),
      created_at: now,
      updated_at: now,
    }
  }
}

/// An author's edit. Every present field is applied in one atomic mutation.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
  pub title:            Option<String>,
  pub body:             Option<String>,
  pub remove_photo:     bool,
  pub visibility:       Option<VisibilityRequest>,
  pub request_feedback: bool,
}

impl EntryPatch {
  pub fn visibility(request: VisibilityRequest) -> Self {
    Self { visibility: Some(request), ..Self::default() }
  }

  pub fn request_feedback() -> Self {
    Self { request_feedback: true, ..Self::default() }
  }

  /// Reject blank replacement text before any store call is made.
  pub fn validate(&self) -> Result<()> {
    if let Some(title) = &self.title {
      require_text("title", title)?;
    }
    if let Some(body) = &self.body {
      require_text("body", body)?;
    }
    Ok(())
  }

  /// Apply the patch to `entry`. On error `entry` may be half-edited; stores
  /// run this against a scratch copy and drop it.
  pub fn apply(self, entry: &mut ReflectionEntry) -> Result<()> {
    if let Some(title) = self.title {
      entry.title = title;
    }
    if let Some(body) = self.body {
      entry.body = body;
    }
    if self.remove_photo {
      entry.photo_ref = None;
    }
    if let Some(request) = self.visibility {
      entry.visibility = crate::visibility::transition(&entry.visibility, &request)?;
    }
    if self.request_feedback {
      entry.feedback_state = entry.feedback_state.request()?;
    }
    Ok(())
  }
}

/// Require `value` to contain something other than whitespace.
pub fn require_text(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    Err(Error::validation(format!("{field} is required")))
  } else {
    Ok(())
  }
}
