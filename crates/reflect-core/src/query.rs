//! Read-side filtering and presentation of entry listings.
//!
//! Filters never reorder unless an explicit [`SortOrder`] asks for it, and
//! sorting is stable, so identical queries over the same snapshot return the
//! same sequence.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  assets::PhotoRef, entry::ReflectionEntry, feedback::FeedbackState,
  visibility::Visibility,
};

// ─── Filters ─────────────────────────────────────────────────────────────────

/// Feedback-status filter for the teacher's request listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackFilter {
  #[default]
  All,
  Given,
  #[serde(alias = "NotGiven")]
  NotGiven,
}

impl FeedbackFilter {
  pub fn matches(self, state: FeedbackState) -> bool {
    match self {
      Self::All => true,
      Self::Given => state.is_given(),
      Self::NotGiven => !state.is_given(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
  /// Whatever order the store returns.
  #[default]
  Stored,
  Newest,
  Oldest,
}

/// Text and status filters; the two conjoin.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryFilter {
  /// Case-insensitive substring matched against the title only.
  pub text:   Option<String>,
  #[serde(default)]
  pub status: FeedbackFilter,
  #[serde(default)]
  pub sort:   SortOrder,
}

impl EntryFilter {
  pub fn text(text: impl Into<String>) -> Self {
    Self { text: Some(text.into()), ..Self::default() }
  }

  /// The same filter with the status part dropped, for listings where feedback
  /// status is not a selectable facet.
  pub fn without_status(&self) -> Self {
    Self { status: FeedbackFilter::All, ..self.clone() }
  }

  pub fn matches(&self, entry: &ReflectionEntry) -> bool {
    let text_ok = match self.text.as_deref().map(str::trim) {
      None | Some("") => true,
      Some(needle) => entry.title.to_lowercase().contains(&needle.to_lowercase()),
    };
    text_ok && self.status.matches(entry.feedback_state)
  }

  pub fn apply(&self, mut entries: Vec<ReflectionEntry>) -> Vec<ReflectionEntry> {
    entries.retain(|e| self.matches(e));
    match self.sort {
      SortOrder::Stored => {}
      SortOrder::Newest => entries.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
      SortOrder::Oldest => entries.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
    }
    entries
  }
}

// ─── Presentation ────────────────────────────────────────────────────────────

/// An entry as shown to one particular viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryView {
  pub entry_id:       Uuid,
  /// `None` when the entry is anonymous and the viewer may not see its author.
  pub author_id:      Option<Uuid>,
  pub title:          String,
  pub body:           String,
  pub photo_ref:      Option<PhotoRef>,
  pub visibility:     Visibility,
  pub feedback_state: FeedbackState,
  pub likes:          usize,
  pub liked_by:       BTreeSet<Uuid>,
  pub is_liked:       bool,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl EntryView {
  /// Build the view for `viewer`. `reveal_author` lifts anonymity, which the
  /// caller grants to the author and to teachers of the classroom.
  pub fn new(entry: ReflectionEntry, viewer: Uuid, reveal_author: bool) -> Self {
    let author_id = (reveal_author || !entry.visibility.is_anonymous())
      .then_some(entry.author_id);
    Self {
      entry_id: entry.entry_id,
      author_id,
      likes: entry.like_count(),
      is_liked: entry.liked_by.contains(&viewer),
      title: entry.title,
      body: entry.body,
      photo_ref: entry.photo_ref,
      visibility: entry.visibility,
      feedback_state: entry.feedback_state,
      liked_by: entry.liked_by,
      created_at: entry.created_at,
      updated_at: entry.updated_at,
    }
  }
}
