//! The journal service: every operation on entries, authorized by the guard
//! and applied through one atomic store mutation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  assets::{Asset, AssetStore, PhotoRef},
  directory::{ClassroomDirectory, Identity, Role},
  entry::{EntryChange, EntryPatch, NewEntry, ReflectionEntry, require_text},
  feedback::Feedback,
  guard::{Guard, require_author},
  likes::{self, LikeOutcome},
  query::{EntryFilter, EntryView},
  store::{EntryStore, FeedbackStore},
  visibility::VisibilityRequest,
};

fn store_error<E: Into<Error>>(err: E) -> Error { err.into() }

/// Entry operations on top of a storage backend `S` and a photo store `A`.
///
/// Cloning is cheap; both collaborators are reference-counted.
pub struct Journal<S, A> {
  store:  Arc<S>,
  assets: Arc<A>,
}

impl<S, A> Clone for Journal<S, A> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), assets: Arc::clone(&self.assets) }
  }
}

impl<S, A> Journal<S, A>
where
  S: EntryStore + FeedbackStore + ClassroomDirectory,
  A: AssetStore,
{
  pub fn new(store: Arc<S>, assets: Arc<A>) -> Self { Self { store, assets } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  fn guard(&self) -> Guard<'_, S> { Guard::new(&*self.store) }

  async fn load(&self, entry_id: Uuid) -> Result<ReflectionEntry> {
    self
      .store
      .get_entry(entry_id)
      .await
      .map_err(store_error)?
      .ok_or(Error::EntryNotFound(entry_id))
  }

  async fn modify<F>(&self, entry_id: Uuid, apply: F) -> Result<EntryChange>
  where
    F: FnOnce(&mut ReflectionEntry) -> Result<()> + Send + 'static,
  {
    self.store.modify_entry(entry_id, apply).await.map_err(Into::into)
  }

  /// Drop a photo that no entry references any more. Failure only leaks a
  /// file, so it is logged rather than surfaced.
  async fn discard_photo(&self, photo: PhotoRef) {
    let label = photo.to_string();
    if let Err(e) = self.assets.delete(photo).await {
      warn!(photo = %label, error = %e, "failed to delete detached photo");
    }
  }

  // ── Entry lifecycle ───────────────────────────────────────────────────────

  /// Create a private entry owned by `actor`.
  pub async fn create(
    &self,
    actor: &Identity,
    title: String,
    body: String,
  ) -> Result<ReflectionEntry> {
    let input = NewEntry::new(actor.user_id, title, body)?;
    let entry = self.store.insert_entry(input).await.map_err(store_error)?;
    info!(entry = %entry.entry_id, author = %actor.user_id, "entry created");
    Ok(entry)
  }

  /// Fetch one entry as `actor` is allowed to see it.
  pub async fn get(&self, actor: &Identity, entry_id: Uuid) -> Result<EntryView> {
    let entry = self.load(entry_id).await?;
    let access = self.guard().require_viewer(actor, &entry).await?;
    Ok(EntryView::new(entry, actor.user_id, access.reveals_author()))
  }

  /// Apply an author's edit: text, photo removal, visibility and the feedback
  /// request, all or nothing.
  pub async fn edit(
    &self,
    actor: &Identity,
    entry_id: Uuid,
    patch: EntryPatch,
  ) -> Result<ReflectionEntry> {
    patch.validate()?;
    let current = self.load(entry_id).await?;
    require_author(actor, &current)?;

    if let Some(classroom_id) =
      patch.visibility.as_ref().and_then(VisibilityRequest::membership_target)
    {
      self.guard().require_membership(current.author_id, classroom_id).await?;
    }

    let change = self.modify(entry_id, move |entry| patch.apply(entry)).await?;

    if change.before.visibility != change.after.visibility {
      info!(
        entry = %entry_id,
        from = change.before.visibility.discriminant(),
        to = change.after.visibility.discriminant(),
        "visibility changed"
      );
    }
    if change.before.feedback_state != change.after.feedback_state {
      info!(entry = %entry_id, "feedback requested");
    }
    if let Some(photo) = change.detached_photo().cloned() {
      self.discard_photo(photo).await;
    }
    Ok(change.after)
  }

  pub async fn set_visibility(
    &self,
    actor: &Identity,
    entry_id: Uuid,
    request: VisibilityRequest,
  ) -> Result<ReflectionEntry> {
    self.edit(actor, entry_id, EntryPatch::visibility(request)).await
  }

  /// Hard-delete an entry together with its likes and photo.
  pub async fn delete(&self, actor: &Identity, entry_id: Uuid) -> Result<ReflectionEntry> {
    let current = self.load(entry_id).await?;
    require_author(actor, &current)?;

    let removed = self
      .store
      .delete_entry(entry_id)
      .await
      .map_err(store_error)?
      .ok_or(Error::EntryNotFound(entry_id))?;

    if let Some(photo) = removed.photo_ref.clone() {
      self.discard_photo(photo).await;
    }
    info!(entry = %entry_id, "entry deleted");
    Ok(removed)
  }

  // ── Photos ────────────────────────────────────────────────────────────────

  /// Attach a new photo, replacing (and deleting) any previous one.
  pub async fn set_photo(
    &self,
    actor: &Identity,
    entry_id: Uuid,
    data: Vec<u8>,
    media_type: String,
  ) -> Result<ReflectionEntry> {
    if data.is_empty() {
      return Err(Error::validation("photo is empty"));
    }
    let current = self.load(entry_id).await?;
    require_author(actor, &current)?;

    let photo = self.assets.store(data, media_type).await?;
    let attached = photo.clone();
    match self
      .modify(entry_id, move |entry| {
        entry.photo_ref = Some(attached);
        Ok(())
      })
      .await
    {
      Ok(change) => {
        if let Some(old) = change.detached_photo().cloned() {
          self.discard_photo(old).await;
        }
        Ok(change.after)
      }
      Err(e) => {
        self.discard_photo(photo).await;
        Err(e)
      }
    }
  }

  pub async fn remove_photo(&self, actor: &Identity, entry_id: Uuid) -> Result<ReflectionEntry> {
    let patch = EntryPatch { remove_photo: true, ..EntryPatch::default() };
    self.edit(actor, entry_id, patch).await
  }

  /// Load an entry's photo for anyone who may view the entry.
  pub async fn photo(&self, actor: &Identity, entry_id: Uuid) -> Result<Option<Asset>> {
    let entry = self.load(entry_id).await?;
    self.guard().require_viewer(actor, &entry).await?;
    match &entry.photo_ref {
      Some(photo) => self.assets.load(photo).await,
      None => Ok(None),
    }
  }

  // ── Feedback ──────────────────────────────────────────────────────────────

  /// Author asks for the single feedback round.
  pub async fn request_feedback(
    &self,
    actor: &Identity,
    entry_id: Uuid,
  ) -> Result<ReflectionEntry> {
    self.edit(actor, entry_id, EntryPatch::request_feedback()).await
  }

  /// A teacher of the entry's classroom answers a pending request.
  pub async fn give_feedback(
    &self,
    actor: &Identity,
    entry_id: Uuid,
    content: String,
  ) -> Result<Feedback> {
    require_text("content", &content)?;
    let current = self.load(entry_id).await?;
    let classroom_id = current
      .visibility
      .classroom_id()
      .ok_or_else(|| Error::forbidden("entry is not published to a classroom"))?;
    self.guard().require_teacher_of(actor, classroom_id).await?;

    let feedback = Feedback {
      entry_id,
      teacher_id: actor.user_id,
      content,
      given_at: Utc::now(),
    };
    let (_, feedback) = self
      .store
      .record_feedback(feedback, move |entry| {
        if entry.visibility.classroom_id() != Some(classroom_id) {
          return Err(Error::Conflict(
            "entry left the classroom while feedback was being given".to_owned(),
          ));
        }
        entry.feedback_state = entry.feedback_state.give()?;
        Ok(())
      })
      .await?;

    info!(entry = %entry_id, teacher = %actor.user_id, "feedback given");
    Ok(feedback)
  }

  /// Read the feedback on an entry: its author, or a teacher of its classroom.
  pub async fn feedback(&self, actor: &Identity, entry_id: Uuid) -> Result<Option<Feedback>> {
    let entry = self.load(entry_id).await?;
    if !entry.is_author(actor.user_id) {
      let classroom_id = entry
        .visibility
        .classroom_id()
        .ok_or_else(|| Error::forbidden("entry is private"))?;
      self.guard().require_teacher_of(actor, classroom_id).await?;
    }
    self.store.get_feedback(entry_id).await
  }

  // ── Likes ─────────────────────────────────────────────────────────────────

  /// Like or unlike an entry on behalf of `actor`.
  pub async fn toggle_like(&self, actor: &Identity, entry_id: Uuid) -> Result<LikeOutcome> {
    let current = self.load(entry_id).await?;
    self.guard().require_viewer(actor, &current).await?;

    // Only the classroom decides who may like; flipping anonymity does not.
    let seen = current.visibility.classroom_id();
    let user_id = actor.user_id;
    let change = self
      .modify(entry_id, move |entry| {
        if entry.visibility.classroom_id() != seen {
          return Err(Error::Conflict(
            "entry changed classroom while liking".to_owned(),
          ));
        }
        likes::toggle(&mut entry.liked_by, user_id);
        Ok(())
      })
      .await?;

    Ok(LikeOutcome::for_user(&change.after, user_id))
  }

  // ── Listings ──────────────────────────────────────────────────────────────

  /// The actor's own entries.
  pub async fn list_own(&self, actor: &Identity, filter: &EntryFilter) -> Result<Vec<EntryView>> {
    let entries = self.store.list_by_author(actor.user_id).await.map_err(store_error)?;
    Ok(
      filter
        .without_status()
        .apply(entries)
        .into_iter()
        .map(|e| EntryView::new(e, actor.user_id, true))
        .collect(),
    )
  }

  /// Entries published into a classroom, as one of its members sees them.
  pub async fn list_classroom_public(
    &self,
    actor: &Identity,
    classroom_id: Uuid,
    filter: &EntryFilter,
  ) -> Result<Vec<EntryView>> {
    let access = self.guard().require_classroom_reader(actor, classroom_id).await?;
    let entries = self.store.list_published_in(classroom_id).await.map_err(store_error)?;
    Ok(
      filter
        .without_status()
        .apply(entries)
        .into_iter()
        .map(|e| {
          let reveal = access.reveals_author() || e.is_author(actor.user_id);
          EntryView::new(e, actor.user_id, reveal)
        })
        .collect(),
    )
  }

  /// Feedback requests across every classroom the teacher teaches.
  pub async fn list_feedback_requests(
    &self,
    actor: &Identity,
    filter: &EntryFilter,
  ) -> Result<Vec<EntryView>> {
    if actor.role != Role::Teacher {
      return Err(Error::forbidden("only teachers can list feedback requests"));
    }
    let classrooms = self.store.classrooms_taught_by(actor.user_id).await?;
    if classrooms.is_empty() {
      return Ok(Vec::new());
    }
    let entries = self
      .store
      .list_feedback_requested(&classrooms)
      .await
      .map_err(store_error)?;
    Ok(
      filter
        .apply(entries)
        .into_iter()
        .map(|e| EntryView::new(e, actor.user_id, true))
        .collect(),
    )
  }
}
