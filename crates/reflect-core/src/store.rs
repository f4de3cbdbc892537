//! Storage traits for entries and feedback content.
//!
//! Implemented by storage backends (e.g. `reflect-store-sqlite`). The
//! [`crate::Journal`] depends on these abstractions, not on any concrete
//! backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  entry::{EntryChange, NewEntry, ReflectionEntry},
  feedback::Feedback,
};

/// Durable record of reflection entries.
///
/// Every write is atomic per entry: concurrent calls against the same entry
/// are applied one after another and none of them is lost.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait EntryStore: Send + Sync {
  /// Backend error. Domain rejections raised inside
  /// [`modify_entry`](Self::modify_entry) must convert back into the original
  /// [`crate::Error`] unchanged.
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  /// Persist a new private entry with no feedback request and no likes.
  fn insert_entry(
    &self,
    input: NewEntry,
  ) -> impl Future<Output = Result<ReflectionEntry, Self::Error>> + Send + '_;

  /// Retrieve an entry by id. Returns `None` if not found.
  fn get_entry(
    &self,
    entry_id: Uuid,
  ) -> impl Future<Output = Result<Option<ReflectionEntry>, Self::Error>> + Send + '_;

  /// Atomically read, mutate and write back one entry.
  ///
  /// `apply` receives the current state. If it returns an error nothing is
  /// written and the error is surfaced unchanged. On success the store bumps
  /// `updated_at`, checks [`ReflectionEntry::check_update_from`] and commits.
  /// Fails with [`crate::Error::EntryNotFound`] if the entry does not exist.
  fn modify_entry<F>(
    &self,
    entry_id: Uuid,
    apply: F,
  ) -> impl Future<Output = Result<EntryChange, Self::Error>> + Send + '_
  where
    F: FnOnce(&mut ReflectionEntry) -> crate::Result<()> + Send + 'static;

  /// Remove an entry and its likes in one step. Returns the removed entry, or
  /// `None` if there was nothing to remove.
  fn delete_entry(
    &self,
    entry_id: Uuid,
  ) -> impl Future<Output = Result<Option<ReflectionEntry>, Self::Error>> + Send + '_;

  /// All entries written by `author_id`, in storage order.
  fn list_by_author(
    &self,
    author_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ReflectionEntry>, Self::Error>> + Send + '_;

  /// All entries currently published into `classroom_id`, in storage order.
  fn list_published_in(
    &self,
    classroom_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ReflectionEntry>, Self::Error>> + Send + '_;

  /// Entries whose feedback was requested (or already given) and which are
  /// published into one of `classroom_ids`.
  fn list_feedback_requested<'a>(
    &'a self,
    classroom_ids: &'a [Uuid],
  ) -> impl Future<Output = Result<Vec<ReflectionEntry>, Self::Error>> + Send + 'a;
}

/// Keeps the feedback text a teacher writes, keyed by entry id.
pub trait FeedbackStore: Send + Sync {
  /// Atomically advance the entry with `apply` and store `feedback` for it.
  ///
  /// Both writes commit together or not at all: if `apply` rejects the entry
  /// or the content cannot be stored, the entry keeps its previous state.
  fn record_feedback<F>(
    &self,
    feedback: Feedback,
    apply: F,
  ) -> impl Future<Output = crate::Result<(EntryChange, Feedback)>> + Send + '_
  where
    F: FnOnce(&mut ReflectionEntry) -> crate::Result<()> + Send + 'static;

  fn get_feedback(
    &self,
    entry_id: Uuid,
  ) -> impl Future<Output = crate::Result<Option<Feedback>>> + Send + '_;
}
