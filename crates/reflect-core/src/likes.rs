//! The like ledger: one toggle per `(entry, user)` pair.

use std::collections::BTreeSet;

use serde::Serialize;
use uuid::Uuid;

use crate::entry::ReflectionEntry;

/// Flip `user_id`'s membership in `liked_by`.
///
/// Returns the membership after the toggle.
pub fn toggle(liked_by: &mut BTreeSet<Uuid>, user_id: Uuid) -> bool {
  if liked_by.remove(&user_id) {
    false
  } else {
    liked_by.insert(user_id);
    true
  }
}

/// Authoritative result of a like toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikeOutcome {
  pub entry_id: Uuid,
  /// Whether the acting user likes the entry after the toggle.
  pub liked:    bool,
  pub likes:    usize,
  pub liked_by: BTreeSet<Uuid>,
}

impl LikeOutcome {
  pub fn for_user(entry: &ReflectionEntry, user_id: Uuid) -> Self {
    Self {
      entry_id: entry.entry_id,
      liked:    entry.liked_by.contains(&user_id),
      likes:    entry.like_count(),
      liked_by: entry.liked_by.clone(),
    }
  }
}
