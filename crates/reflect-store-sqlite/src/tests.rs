//! Integration tests for `SqliteStore` against an in-memory database, both on
//! its own and driven through the `Journal`.

use std::{
  collections::{BTreeSet, HashMap},
  sync::{Arc, Mutex},
};

use reflect_core::{
  Error as CoreError, Journal,
  assets::{Asset, AssetStore, PhotoRef},
  directory::{ClassroomDirectory, Identity, Role},
  entry::{EntryPatch, NewEntry},
  feedback::{Feedback, FeedbackState},
  query::{EntryFilter, FeedbackFilter, SortOrder},
  store::{EntryStore, FeedbackStore},
  visibility::{Visibility, VisibilityRequest},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn feedback(entry_id: Uuid, content: &str) -> Feedback {
  Feedback {
    entry_id,
    teacher_id: Uuid::new_v4(),
    content: content.into(),
    given_at: Utc::now(),
  }
}

/// Photos kept in memory, keyed by a fresh reference per upload.
#[derive(Default)]
struct MemoryAssets {
  files: Mutex<HashMap<String, Asset>>,
}

impl MemoryAssets {
  fn len(&self) -> usize { self.files.lock().unwrap().len() }
}

impl AssetStore for MemoryAssets {
  async fn store(&self, data: Vec<u8>, media_type: String) -> reflect_core::Result<PhotoRef> {
    let photo = PhotoRef::new(Uuid::new_v4().to_string());
    self
      .files
      .lock()
      .unwrap()
      .insert(photo.as_str().to_owned(), Asset { data, media_type });
    Ok(photo)
  }

  async fn load<'a>(&'a self, photo: &'a PhotoRef) -> reflect_core::Result<Option<Asset>> {
    Ok(self.files.lock().unwrap().get(photo.as_str()).cloned())
  }

  async fn delete(&self, photo: PhotoRef) -> reflect_core::Result<()> {
    self.files.lock().unwrap().remove(photo.as_str());
    Ok(())
  }
}

/// One classroom with its teacher and two enrolled students, plus an outsider.
struct Class {
  journal:   Journal<SqliteStore, MemoryAssets>,
  assets:    Arc<MemoryAssets>,
  classroom: Uuid,
  teacher:   Identity,
  author:    Identity,
  peer:      Identity,
  outsider:  Identity,
}

async fn user(s: &SqliteStore, name: &str, role: Role) -> Identity {
  let record = s.add_user(name, role, "hash").await.unwrap();
  Identity { user_id: record.user_id, role }
}

async fn class() -> Class {
  let s = store().await;
  let teacher = user(&s, "ms-frizzle", Role::Teacher).await;
  let author = user(&s, "arnold", Role::Student).await;
  let peer = user(&s, "wanda", Role::Student).await;
  let outsider = user(&s, "janet", Role::Student).await;

  let classroom = s.add_classroom("Science", "ms-frizzle").await.unwrap();
  s.enroll(classroom, author.user_id).await.unwrap();
  s.enroll(classroom, peer.user_id).await.unwrap();

  let assets = Arc::new(MemoryAssets::default());
  Class {
    journal: Journal::new(Arc::new(s), Arc::clone(&assets)),
    assets,
    classroom,
    teacher,
    author,
    peer,
    outsider,
  }
}

// ─── Entry store ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_entry() {
  let s = store().await;
  let author = Uuid::new_v4();

  let input = NewEntry::new(author, "T".into(), "B".into()).unwrap();
  let entry = s.insert_entry(input).await.unwrap();
  assert_eq!(entry.visibility, Visibility::Private);
  assert_eq!(entry.feedback_state, FeedbackState::NotRequested);
  assert!(entry.liked_by.is_empty());

  let fetched = s.get_entry(entry.entry_id).await.unwrap().unwrap();
  assert_eq!(fetched.entry_id, entry.entry_id);
  assert_eq!(fetched.title, "T");
  assert_eq!(fetched.created_at, entry.created_at);
}

#[tokio::test]
async fn get_entry_missing_returns_none() {
  let s = store().await;
  assert!(s.get_entry(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn modify_persists_likes_and_visibility() {
  let s = store().await;
  let entry = s
    .insert_entry(NewEntry::new(Uuid::new_v4(), "T".into(), "B".into()).unwrap())
    .await
    .unwrap();
  let classroom = Uuid::new_v4();
  let liker = Uuid::new_v4();

  let change = s
    .modify_entry(entry.entry_id, move |e| {
      e.visibility = Visibility::published(classroom, false);
      e.liked_by.insert(liker);
      Ok(())
    })
    .await
    .unwrap();
  assert_eq!(change.before.visibility, Visibility::Private);
  assert!(change.after.updated_at >= change.before.updated_at);

  let fetched = s.get_entry(entry.entry_id).await.unwrap().unwrap();
  assert_eq!(fetched.visibility, Visibility::PublicAttributed { classroom_id: classroom });
  assert_eq!(fetched.liked_by, BTreeSet::from([liker]));
}

#[tokio::test]
async fn failed_modify_leaves_row_untouched() {
  let s = store().await;
  let entry = s
    .insert_entry(NewEntry::new(Uuid::new_v4(), "T".into(), "B".into()).unwrap())
    .await
    .unwrap();

  let result = s
    .modify_entry(entry.entry_id, |e| {
      e.title = "changed".into();
      e.liked_by.insert(Uuid::new_v4());
      Err(CoreError::Conflict("nope".into()))
    })
    .await;
  assert!(matches!(result, Err(Error::Core(CoreError::Conflict(_)))));

  let fetched = s.get_entry(entry.entry_id).await.unwrap().unwrap();
  assert_eq!(fetched, entry);
}

#[tokio::test]
async fn modify_rejects_blank_title_after_apply() {
  let s = store().await;
  let entry = s
    .insert_entry(NewEntry::new(Uuid::new_v4(), "T".into(), "B".into()).unwrap())
    .await
    .unwrap();

  let result = s
    .modify_entry(entry.entry_id, |e| {
      e.title = "   ".into();
      Ok(())
    })
    .await;
  assert!(matches!(result, Err(Error::Core(CoreError::Validation(_)))));
}

#[tokio::test]
async fn modify_missing_entry_is_not_found() {
  let s = store().await;
  let id = Uuid::new_v4();
  let result = s.modify_entry(id, |_| Ok(())).await;
  let err: CoreError = result.unwrap_err().into();
  assert!(matches!(err, CoreError::EntryNotFound(missing) if missing == id));
}

#[tokio::test]
async fn listings_keep_insertion_order() {
  let s = store().await;
  let author = Uuid::new_v4();
  let classroom = Uuid::new_v4();
  let mut ids = Vec::new();
  for title in ["one", "two", "three"] {
    let e = s
      .insert_entry(NewEntry::new(author, title.into(), "B".into()).unwrap())
      .await
      .unwrap();
    ids.push(e.entry_id);
  }
  s.insert_entry(NewEntry::new(Uuid::new_v4(), "other".into(), "B".into()).unwrap())
    .await
    .unwrap();

  let own: Vec<_> = s.list_by_author(author).await.unwrap().iter().map(|e| e.entry_id).collect();
  assert_eq!(own, ids);

  for id in [ids[2], ids[0]] {
    s.modify_entry(id, move |e| {
      e.visibility = Visibility::published(classroom, true);
      Ok(())
    })
    .await
    .unwrap();
  }
  let public: Vec<_> =
    s.list_published_in(classroom).await.unwrap().iter().map(|e| e.entry_id).collect();
  assert_eq!(public, vec![ids[0], ids[2]]);
}

#[tokio::test]
async fn feedback_requested_listing_is_scoped_to_classrooms() {
  let s = store().await;
  let mine = Uuid::new_v4();
  let theirs = Uuid::new_v4();

  for (classroom, state) in [
    (mine, FeedbackState::Requested),
    (mine, FeedbackState::NotRequested),
    (theirs, FeedbackState::Requested),
  ] {
    let e = s
      .insert_entry(NewEntry::new(Uuid::new_v4(), "T".into(), "B".into()).unwrap())
      .await
      .unwrap();
    s.modify_entry(e.entry_id, move |e| {
      e.visibility = Visibility::published(classroom, false);
      e.feedback_state = state;
      Ok(())
    })
    .await
    .unwrap();
  }

  let listed = s.list_feedback_requested(&[mine]).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].visibility.classroom_id(), Some(mine));
  assert!(s.list_feedback_requested(&[]).await.unwrap().is_empty());
  assert_eq!(s.list_feedback_requested(&[mine, theirs]).await.unwrap().len(), 2);
}

#[tokio::test]
async fn delete_removes_likes_and_feedback() {
  let s = store().await;
  let entry = s
    .insert_entry(NewEntry::new(Uuid::new_v4(), "T".into(), "B".into()).unwrap())
    .await
    .unwrap();
  s.modify_entry(entry.entry_id, |e| {
    e.liked_by.insert(Uuid::new_v4());
    Ok(())
  })
  .await
  .unwrap();
  s.record_feedback(feedback(entry.entry_id, "good"), |e| {
    e.feedback_state = FeedbackState::Requested;
    Ok(())
  })
  .await
  .unwrap();

  let removed = s.delete_entry(entry.entry_id).await.unwrap().unwrap();
  assert_eq!(removed.like_count(), 1);
  assert!(s.get_entry(entry.entry_id).await.unwrap().is_none());
  assert!(s.get_feedback(entry.entry_id).await.unwrap().is_none());
  assert!(s.delete_entry(entry.entry_id).await.unwrap().is_none());
}

#[tokio::test]
async fn rejected_feedback_stores_nothing() {
  let s = store().await;
  let entry = s
    .insert_entry(NewEntry::new(Uuid::new_v4(), "T".into(), "B".into()).unwrap())
    .await
    .unwrap();

  let result = s
    .record_feedback(feedback(entry.entry_id, "early"), |e| {
      e.feedback_state = e.feedback_state.give()?;
      Ok(())
    })
    .await;
  assert!(matches!(result, Err(CoreError::InvalidState { .. })));
  assert!(s.get_feedback(entry.entry_id).await.unwrap().is_none());
  assert_eq!(s.get_entry(entry.entry_id).await.unwrap().unwrap(), entry);
}

// ─── Directory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn usernames_are_unique() {
  let s = store().await;
  s.add_user("alice", Role::Student, "h").await.unwrap();
  assert!(matches!(
    s.add_user("alice", Role::Teacher, "h").await,
    Err(Error::UsernameTaken(name)) if name == "alice"
  ));
  let found = s.find_user("alice").await.unwrap().unwrap();
  assert_eq!(found.role, Role::Student);
  assert!(s.find_user("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn classroom_membership_and_roles() {
  let s = store().await;
  let teacher = s.add_user("t", Role::Teacher, "h").await.unwrap();
  let student = s.add_user("s", Role::Student, "h").await.unwrap();

  assert!(matches!(
    s.add_classroom("Art", "nobody").await,
    Err(Error::UserNotFound(_))
  ));
  assert!(s.add_classroom("Art", "s").await.is_err());

  let classroom = s.add_classroom("Art", "t").await.unwrap();
  assert!(s.classroom_exists(classroom).await.unwrap());
  assert!(!s.is_member(classroom, student.user_id).await.unwrap());

  s.enroll(classroom, student.user_id).await.unwrap();
  s.enroll(classroom, student.user_id).await.unwrap();
  assert!(s.is_member(classroom, student.user_id).await.unwrap());
  assert!(s.is_member(classroom, teacher.user_id).await.unwrap());
  assert!(s.is_teacher(classroom, teacher.user_id).await.unwrap());
  assert!(!s.is_teacher(classroom, student.user_id).await.unwrap());
  assert_eq!(s.classrooms_taught_by(teacher.user_id).await.unwrap(), vec![classroom]);
  assert_eq!(s.role(student.user_id).await.unwrap(), Some(Role::Student));
  assert_eq!(s.role(Uuid::new_v4()).await.unwrap(), None);

  let missing = Uuid::new_v4();
  assert!(matches!(
    s.enroll(missing, student.user_id).await,
    Err(Error::Core(CoreError::ClassroomNotFound(c))) if c == missing
  ));
}

// ─── Journal scenario ────────────────────────────────────────────────────────

#[tokio::test]
async fn reflection_lifecycle_scenario() {
  let c = class().await;
  let j = &c.journal;

  let entry = j.create(&c.author, "T".into(), "B".into()).await.unwrap();
  assert_eq!(entry.visibility, Visibility::Private);
  assert_eq!(entry.feedback_state, FeedbackState::NotRequested);
  assert!(entry.liked_by.is_empty());
  let id = entry.entry_id;

  let published = j
    .set_visibility(&c.author, id, VisibilityRequest::publish(c.classroom, true))
    .await
    .unwrap();
  assert_eq!(published.visibility, Visibility::PublicAnonymous { classroom_id: c.classroom });

  let liked = j.toggle_like(&c.peer, id).await.unwrap();
  assert!(liked.liked);
  assert_eq!(liked.likes, 1);
  assert_eq!(liked.liked_by, BTreeSet::from([c.peer.user_id]));

  let unliked = j.toggle_like(&c.peer, id).await.unwrap();
  assert!(!unliked.liked);
  assert_eq!(unliked.likes, 0);

  let requested = j.request_feedback(&c.author, id).await.unwrap();
  assert_eq!(requested.feedback_state, FeedbackState::Requested);

  assert!(matches!(
    j.request_feedback(&c.author, id).await,
    Err(CoreError::InvalidState { .. })
  ));
  assert_eq!(
    j.get(&c.author, id).await.unwrap().feedback_state,
    FeedbackState::Requested
  );

  let feedback = j.give_feedback(&c.teacher, id, "Nice work".into()).await.unwrap();
  assert_eq!(feedback.teacher_id, c.teacher.user_id);
  assert_eq!(j.get(&c.author, id).await.unwrap().feedback_state, FeedbackState::Given);
  let stored = j.feedback(&c.author, id).await.unwrap().unwrap();
  assert_eq!(stored.content, "Nice work");

  assert!(matches!(
    j.toggle_like(&c.outsider, id).await,
    Err(CoreError::Forbidden(_))
  ));
}

#[tokio::test]
async fn non_author_mutations_leave_entry_unchanged() {
  let c = class().await;
  let j = &c.journal;
  let entry = j.create(&c.author, "T".into(), "B".into()).await.unwrap();
  let id = entry.entry_id;
  j.set_visibility(&c.author, id, VisibilityRequest::publish(c.classroom, false))
    .await
    .unwrap();
  let before = j.store().get_entry(id).await.unwrap().unwrap();

  assert!(matches!(
    j.set_visibility(&c.peer, id, VisibilityRequest::private()).await,
    Err(CoreError::Forbidden(_))
  ));
  assert!(matches!(
    j.request_feedback(&c.peer, id).await,
    Err(CoreError::Forbidden(_))
  ));
  let patch = EntryPatch { title: Some("mine now".into()), ..EntryPatch::default() };
  assert!(matches!(j.edit(&c.teacher, id, patch).await, Err(CoreError::Forbidden(_))));
  assert!(matches!(j.delete(&c.peer, id).await, Err(CoreError::Forbidden(_))));

  let after = j.store().get_entry(id).await.unwrap().unwrap();
  assert_eq!(before, after);
}

#[tokio::test]
async fn publishing_requires_membership_and_classroom() {
  let c = class().await;
  let j = &c.journal;
  let entry = j.create(&c.outsider, "T".into(), "B".into()).await.unwrap();

  assert!(matches!(
    j.set_visibility(&c.outsider, entry.entry_id, VisibilityRequest::publish(c.classroom, false))
      .await,
    Err(CoreError::InvalidClassroom(_))
  ));
  assert!(matches!(
    j.set_visibility(&c.outsider, entry.entry_id, VisibilityRequest::anonymity(true)).await,
    Err(CoreError::InvalidTransition(_))
  ));
  let stored = j.store().get_entry(entry.entry_id).await.unwrap().unwrap();
  assert_eq!(stored.visibility, Visibility::Private);
}

#[tokio::test]
async fn anonymity_toggle_keeps_classroom_and_likes() {
  let c = class().await;
  let j = &c.journal;
  let id = j.create(&c.author, "T".into(), "B".into()).await.unwrap().entry_id;
  j.set_visibility(&c.author, id, VisibilityRequest::publish(c.classroom, false))
    .await
    .unwrap();
  j.toggle_like(&c.peer, id).await.unwrap();

  let anon = j.set_visibility(&c.author, id, VisibilityRequest::anonymity(true)).await.unwrap();
  assert_eq!(anon.visibility, Visibility::PublicAnonymous { classroom_id: c.classroom });

  let private = j.set_visibility(&c.author, id, VisibilityRequest::private()).await.unwrap();
  assert_eq!(private.visibility, Visibility::Private);
  assert_eq!(private.like_count(), 1);
}

#[tokio::test]
async fn concurrent_likes_from_distinct_users_all_land() {
  let c = class().await;
  let j = c.journal.clone();
  let id = j.create(&c.author, "T".into(), "B".into()).await.unwrap().entry_id;
  j.set_visibility(&c.author, id, VisibilityRequest::publish(c.classroom, false))
    .await
    .unwrap();

  let mut students = Vec::new();
  for i in 0..20 {
    let s = user(j.store(), &format!("student-{i}"), Role::Student).await;
    j.store().enroll(c.classroom, s.user_id).await.unwrap();
    students.push(s);
  }

  let handles: Vec<_> = students
    .iter()
    .copied()
    .map(|s| {
      let j = j.clone();
      tokio::spawn(async move { j.toggle_like(&s, id).await })
    })
    .collect();
  for h in handles {
    h.await.unwrap().unwrap();
  }

  let entry = j.store().get_entry(id).await.unwrap().unwrap();
  assert_eq!(entry.like_count(), 20);
  let expected: BTreeSet<_> = students.iter().map(|s| s.user_id).collect();
  assert_eq!(entry.liked_by, expected);
}

#[tokio::test]
async fn likes_land_while_author_flips_anonymity() {
  let c = class().await;
  let j = c.journal.clone();
  let id = j.create(&c.author, "T".into(), "B".into()).await.unwrap().entry_id;
  j.set_visibility(&c.author, id, VisibilityRequest::publish(c.classroom, false))
    .await
    .unwrap();

  let author = c.author;
  let flips = tokio::spawn({
    let j = j.clone();
    async move {
      for i in 0..100 {
        j.set_visibility(&author, id, VisibilityRequest::anonymity(i % 2 == 0)).await?;
      }
      Ok::<_, CoreError>(())
    }
  });
  let peer = c.peer;
  let likes = tokio::spawn({
    let j = j.clone();
    async move {
      for _ in 0..100 {
        j.toggle_like(&peer, id).await?;
      }
      Ok::<_, CoreError>(())
    }
  });
  flips.await.unwrap().unwrap();
  likes.await.unwrap().unwrap();

  let entry = j.store().get_entry(id).await.unwrap().unwrap();
  assert_eq!(entry.like_count(), 0);
  assert_eq!(entry.visibility.classroom_id(), Some(c.classroom));
}

#[tokio::test]
async fn concurrent_double_toggle_by_one_user_cancels_out() {
  let c = class().await;
  let j = c.journal.clone();
  let id = j.create(&c.author, "T".into(), "B".into()).await.unwrap().entry_id;
  j.set_visibility(&c.author, id, VisibilityRequest::publish(c.classroom, false))
    .await
    .unwrap();

  let peer = c.peer;
  let first = tokio::spawn({
    let j = j.clone();
    async move { j.toggle_like(&peer, id).await }
  });
  let second = tokio::spawn({
    let j = j.clone();
    async move { j.toggle_like(&peer, id).await }
  });
  let a = first.await.unwrap().unwrap();
  let b = second.await.unwrap().unwrap();

  // One of the two added the like, the other removed it.
  assert_ne!(a.liked, b.liked);
  assert_eq!(j.store().get_entry(id).await.unwrap().unwrap().like_count(), 0);
}

#[tokio::test]
async fn feedback_cannot_skip_or_repeat() {
  let c = class().await;
  let j = &c.journal;
  let id = j.create(&c.author, "T".into(), "B".into()).await.unwrap().entry_id;

  // Private entries have no classroom teacher to answer.
  assert!(matches!(
    j.give_feedback(&c.teacher, id, "early".into()).await,
    Err(CoreError::Forbidden(_))
  ));

  j.set_visibility(&c.author, id, VisibilityRequest::publish(c.classroom, false))
    .await
    .unwrap();
  assert!(matches!(
    j.give_feedback(&c.teacher, id, "early".into()).await,
    Err(CoreError::InvalidState { from: FeedbackState::NotRequested, .. })
  ));
  assert!(matches!(
    j.give_feedback(&c.teacher, id, "  ".into()).await,
    Err(CoreError::Validation(_))
  ));

  j.request_feedback(&c.author, id).await.unwrap();
  assert!(matches!(
    j.give_feedback(&c.peer, id, "me too".into()).await,
    Err(CoreError::Forbidden(_))
  ));
  j.give_feedback(&c.teacher, id, "done".into()).await.unwrap();
  assert!(matches!(
    j.give_feedback(&c.teacher, id, "again".into()).await,
    Err(CoreError::InvalidState { from: FeedbackState::Given, .. })
  ));
  assert!(matches!(
    j.request_feedback(&c.author, id).await,
    Err(CoreError::InvalidState { .. })
  ));
  assert_eq!(j.feedback(&c.teacher, id).await.unwrap().unwrap().content, "done");
  assert!(matches!(j.feedback(&c.peer, id).await, Err(CoreError::Forbidden(_))));
}

#[tokio::test]
async fn failed_feedback_write_keeps_request_pending() {
  let c = class().await;
  let j = &c.journal;
  let id = j.create(&c.author, "T".into(), "B".into()).await.unwrap().entry_id;
  j.set_visibility(&c.author, id, VisibilityRequest::publish(c.classroom, false))
    .await
    .unwrap();
  j.request_feedback(&c.author, id).await.unwrap();

  // Make the content insert fail after the state flip has been applied.
  j.store()
    .conn
    .call(|conn| {
      conn.execute_batch("DROP TABLE feedback")?;
      Ok(())
    })
    .await
    .unwrap();

  assert!(matches!(
    j.give_feedback(&c.teacher, id, "Nice work".into()).await,
    Err(CoreError::Backend(_))
  ));
  let entry = j.store().get_entry(id).await.unwrap().unwrap();
  assert_eq!(entry.feedback_state, FeedbackState::Requested);
}

#[tokio::test]
async fn edit_is_all_or_nothing() {
  let c = class().await;
  let j = &c.journal;
  let id = j.create(&c.author, "T".into(), "B".into()).await.unwrap().entry_id;
  j.request_feedback(&c.author, id).await.unwrap();

  // The repeated feedback request fails, so the new title is not kept either.
  let patch = EntryPatch {
    title: Some("Renamed".into()),
    request_feedback: true,
    ..EntryPatch::default()
  };
  assert!(j.edit(&c.author, id, patch).await.is_err());
  assert_eq!(j.get(&c.author, id).await.unwrap().title, "T");
}

// ─── Listings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn classroom_listing_masks_anonymous_authors() {
  let c = class().await;
  let j = &c.journal;
  let id = j.create(&c.author, "Anon".into(), "B".into()).await.unwrap().entry_id;
  j.set_visibility(&c.author, id, VisibilityRequest::publish(c.classroom, true))
    .await
    .unwrap();
  j.toggle_like(&c.peer, id).await.unwrap();
  let filter = EntryFilter::default();

  let seen_by_peer = j.list_classroom_public(&c.peer, c.classroom, &filter).await.unwrap();
  assert_eq!(seen_by_peer.len(), 1);
  assert_eq!(seen_by_peer[0].author_id, None);
  assert!(seen_by_peer[0].is_liked);
  assert_eq!(seen_by_peer[0].likes, 1);

  let seen_by_author = j.list_classroom_public(&c.author, c.classroom, &filter).await.unwrap();
  assert_eq!(seen_by_author[0].author_id, Some(c.author.user_id));
  assert!(!seen_by_author[0].is_liked);

  let seen_by_teacher = j.list_classroom_public(&c.teacher, c.classroom, &filter).await.unwrap();
  assert_eq!(seen_by_teacher[0].author_id, Some(c.author.user_id));

  assert!(matches!(
    j.list_classroom_public(&c.outsider, c.classroom, &filter).await,
    Err(CoreError::Forbidden(_))
  ));
  assert!(matches!(
    j.list_classroom_public(&c.peer, Uuid::new_v4(), &filter).await,
    Err(CoreError::ClassroomNotFound(_))
  ));
}

#[tokio::test]
async fn own_listing_filters_by_title_and_sorts() {
  let c = class().await;
  let j = &c.journal;
  for title in ["Week 1", "Lab notes", "Week 2"] {
    j.create(&c.author, title.into(), "B".into()).await.unwrap();
  }

  let weeks = j.list_own(&c.author, &EntryFilter::text("week")).await.unwrap();
  let titles: Vec<_> = weeks.iter().map(|e| e.title.as_str()).collect();
  assert_eq!(titles, ["Week 1", "Week 2"]);

  let newest = EntryFilter { sort: SortOrder::Newest, ..EntryFilter::default() };
  let listed = j.list_own(&c.author, &newest).await.unwrap();
  assert_eq!(listed.len(), 3);
  assert!(listed.windows(2).all(|w| w[0].created_at >= w[1].created_at));

  assert!(j.list_own(&c.peer, &EntryFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn teacher_listing_filters_by_status() {
  let c = class().await;
  let j = &c.journal;

  let mut ids = Vec::new();
  for title in ["Given one", "Pending one", "Never asked"] {
    let id = j.create(&c.author, title.into(), "B".into()).await.unwrap().entry_id;
    j.set_visibility(&c.author, id, VisibilityRequest::publish(c.classroom, true))
      .await
      .unwrap();
    ids.push(id);
  }
  j.request_feedback(&c.author, ids[0]).await.unwrap();
  j.request_feedback(&c.author, ids[1]).await.unwrap();
  j.give_feedback(&c.teacher, ids[0], "ok".into()).await.unwrap();

  let all = j.list_feedback_requests(&c.teacher, &EntryFilter::default()).await.unwrap();
  assert_eq!(all.len(), 2);
  assert!(all.iter().all(|e| e.author_id == Some(c.author.user_id)));

  let pending = EntryFilter { status: FeedbackFilter::NotGiven, ..EntryFilter::default() };
  let listed = j.list_feedback_requests(&c.teacher, &pending).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].entry_id, ids[1]);

  let given = EntryFilter {
    text:   Some("PENDING".into()),
    status: FeedbackFilter::Given,
    sort:   SortOrder::Stored,
  };
  assert!(j.list_feedback_requests(&c.teacher, &given).await.unwrap().is_empty());

  assert!(matches!(
    j.list_feedback_requests(&c.author, &EntryFilter::default()).await,
    Err(CoreError::Forbidden(_))
  ));
}

// ─── Photos ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn photos_are_replaced_and_cleaned_up() {
  let c = class().await;
  let j = &c.journal;
  let id = j.create(&c.author, "T".into(), "B".into()).await.unwrap().entry_id;

  let first = j.set_photo(&c.author, id, vec![1, 2, 3], "image/png".into()).await.unwrap();
  assert!(first.photo_ref.is_some());
  assert_eq!(c.assets.len(), 1);

  let second = j.set_photo(&c.author, id, vec![4, 5], "image/jpeg".into()).await.unwrap();
  assert_ne!(first.photo_ref, second.photo_ref);
  assert_eq!(c.assets.len(), 1);
  let photo = j.photo(&c.author, id).await.unwrap().unwrap();
  assert_eq!(photo.data, vec![4, 5]);
  assert!(matches!(j.photo(&c.peer, id).await, Err(CoreError::Forbidden(_))));

  assert!(matches!(
    j.set_photo(&c.peer, id, vec![9], "image/png".into()).await,
    Err(CoreError::Forbidden(_))
  ));
  assert_eq!(c.assets.len(), 1);

  let cleared = j.remove_photo(&c.author, id).await.unwrap();
  assert!(cleared.photo_ref.is_none());
  assert_eq!(c.assets.len(), 0);
}

#[tokio::test]
async fn delete_discards_photo() {
  let c = class().await;
  let j = &c.journal;
  let id = j.create(&c.author, "T".into(), "B".into()).await.unwrap().entry_id;
  j.set_photo(&c.author, id, vec![1], "image/gif".into()).await.unwrap();

  j.delete(&c.author, id).await.unwrap();
  assert_eq!(c.assets.len(), 0);
  assert!(matches!(j.get(&c.author, id).await, Err(CoreError::EntryNotFound(_))));
}
