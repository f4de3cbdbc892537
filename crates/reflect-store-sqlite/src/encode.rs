//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Enumerations use their snake_case
//! discriminants.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use reflect_core::{
  assets::PhotoRef,
  directory::Role,
  entry::ReflectionEntry,
  feedback::{Feedback, FeedbackState},
  visibility::Visibility,
};
use uuid::Uuid;

use crate::{Error, Result, directory::UserRecord};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enumerations ─────────────────────────────────────────────────────────────

pub fn decode_feedback_state(s: &str) -> Result<FeedbackState> {
  FeedbackState::from_discriminant(s).ok_or_else(|| Error::Corrupt {
    column: "feedback_state",
    value:  s.to_owned(),
  })
}

pub fn decode_role(s: &str) -> Result<Role> {
  s.parse::<Role>()
    .map_err(|_| Error::Corrupt { column: "role", value: s.to_owned() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawEntry::from_row`].
pub const ENTRY_COLUMNS: &str = "entry_id, author_id, title, body, photo_ref, \
   visibility, classroom_id, feedback_state, created_at, updated_at";

/// Raw strings read directly from an `entries` row.
pub struct RawEntry {
  pub entry_id:       String,
  pub author_id:      String,
  pub title:          String,
  pub body:           String,
  pub photo_ref:      Option<String>,
  pub visibility:     String,
  pub classroom_id:   Option<String>,
  pub feedback_state: String,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entry_id:       row.get(0)?,
      author_id:      row.get(1)?,
      title:          row.get(2)?,
      body:           row.get(3)?,
      photo_ref:      row.get(4)?,
      visibility:     row.get(5)?,
      classroom_id:   row.get(6)?,
      feedback_state: row.get(7)?,
      created_at:     row.get(8)?,
      updated_at:     row.get(9)?,
    })
  }

  /// Decode the row, attaching the like set read from `entry_likes`.
  pub fn into_entry(self, liked_by: &[String]) -> Result<ReflectionEntry> {
    let classroom_id = self.classroom_id.as_deref().map(decode_uuid).transpose()?;
    let visibility = Visibility::from_parts(&self.visibility, classroom_id)
      .ok_or_else(|| Error::Corrupt { column: "visibility", value: self.visibility.clone() })?;
    let liked_by = liked_by
      .iter()
      .map(|s| decode_uuid(s))
      .collect::<Result<BTreeSet<_>>>()?;

    Ok(ReflectionEntry {
      entry_id: decode_uuid(&self.entry_id)?,
      author_id: decode_uuid(&self.author_id)?,
      title: self.title,
      body: self.body,
      photo_ref: self.photo_ref.map(PhotoRef::new),
      visibility,
      feedback_state: decode_feedback_state(&self.feedback_state)?,
      liked_by,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `feedback` row.
pub struct RawFeedback {
  pub entry_id:   String,
  pub teacher_id: String,
  pub content:    String,
  pub given_at:   String,
}

impl RawFeedback {
  pub fn into_feedback(self) -> Result<Feedback> {
    Ok(Feedback {
      entry_id:   decode_uuid(&self.entry_id)?,
      teacher_id: decode_uuid(&self.teacher_id)?,
      content:    self.content,
      given_at:   decode_dt(&self.given_at)?,
    })
  }
}

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub role:          String,
  pub password_hash: String,
}

impl RawUser {
  pub fn into_user(self) -> Result<UserRecord> {
    Ok(UserRecord {
      user_id:       decode_uuid(&self.user_id)?,
      username:      self.username,
      role:          decode_role(&self.role)?,
      password_hash: self.password_hash,
    })
  }
}
