//! [`SqliteStore`]: the SQLite implementation of [`EntryStore`] and
//! [`FeedbackStore`].

use std::{collections::BTreeSet, path::Path};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tracing::debug;
use uuid::Uuid;

use reflect_core::{
  entry::{EntryChange, NewEntry, ReflectionEntry},
  feedback::Feedback,
  store::{EntryStore, FeedbackStore},
};

use crate::{
  Result,
  encode::{ENTRY_COLUMNS, RawEntry, RawFeedback, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A journal store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Every call
/// runs on the connection's own thread, and each mutation runs inside one
/// `IMMEDIATE` transaction, so per-entry read-modify-write is atomic.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn feedback_tx<F>(
    &self,
    feedback: Feedback,
    apply: F,
  ) -> Result<(EntryChange, Feedback)>
  where
    F: FnOnce(&mut ReflectionEntry) -> reflect_core::Result<()> + Send + 'static,
  {
    let entry_id = feedback.entry_id;
    let recorded = self
      .conn
      .call(move |conn| {
        Ok(feedback_in_tx(conn, &feedback, apply).map(|change| (change, feedback)))
      })
      .await??;
    debug!(entry = %entry_id, "feedback recorded");
    Ok(recorded)
  }

  async fn feedback_row(&self, entry_id: Uuid) -> Result<Option<Feedback>> {
    let id_str = encode_uuid(entry_id);

    let raw: Option<RawFeedback> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT entry_id, teacher_id, content, given_at
               FROM feedback WHERE entry_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawFeedback {
                  entry_id:   row.get(0)?,
                  teacher_id: row.get(1)?,
                  content:    row.get(2)?,
                  given_at:   row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawFeedback::into_feedback).transpose()
  }
}

// ─── Synchronous helpers (run on the connection thread) ──────────────────────

fn load_likes(conn: &rusqlite::Connection, entry_id: &str) -> Result<Vec<String>> {
  let mut stmt =
    conn.prepare_cached("SELECT user_id FROM entry_likes WHERE entry_id = ?1")?;
  let rows = stmt
    .query_map(rusqlite::params![entry_id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(rows)
}

fn load_entry(conn: &rusqlite::Connection, entry_id: &str) -> Result<Option<ReflectionEntry>> {
  let raw = conn
    .query_row(
      &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE entry_id = ?1"),
      rusqlite::params![entry_id],
      RawEntry::from_row,
    )
    .optional()?;

  match raw {
    Some(raw) => {
      let likes = load_likes(conn, entry_id)?;
      Ok(Some(raw.into_entry(&likes)?))
    }
    None => Ok(None),
  }
}

/// Run a `SELECT {ENTRY_COLUMNS} ...` query and attach each row's likes.
fn load_entries<P: rusqlite::Params>(
  conn: &rusqlite::Connection,
  sql: &str,
  params: P,
) -> Result<Vec<ReflectionEntry>> {
  let mut stmt = conn.prepare(sql)?;
  let raws = stmt
    .query_map(params, RawEntry::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws
    .into_iter()
    .map(|raw| {
      let likes = load_likes(conn, &raw.entry_id)?;
      raw.into_entry(&likes)
    })
    .collect()
}

fn insert_entry_row(conn: &rusqlite::Connection, entry: &ReflectionEntry) -> Result<()> {
  conn.execute(
    "INSERT INTO entries (
       entry_id, author_id, title, body, photo_ref,
       visibility, classroom_id, feedback_state, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    rusqlite::params![
      encode_uuid(entry.entry_id),
      encode_uuid(entry.author_id),
      entry.title,
      entry.body,
      entry.photo_ref.as_ref().map(|p| p.as_str().to_owned()),
      entry.visibility.discriminant(),
      entry.visibility.classroom_id().map(encode_uuid),
      entry.feedback_state.discriminant(),
      encode_dt(entry.created_at),
      encode_dt(entry.updated_at),
    ],
  )?;
  Ok(())
}

/// Bring `entry_likes` in line with `after`, touching only the rows that
/// changed.
fn sync_likes(
  conn: &rusqlite::Connection,
  entry_id: &str,
  before: &BTreeSet<Uuid>,
  after: &BTreeSet<Uuid>,
  at: &str,
) -> Result<()> {
  for removed in before.difference(after) {
    conn.execute(
      "DELETE FROM entry_likes WHERE entry_id = ?1 AND user_id = ?2",
      rusqlite::params![entry_id, encode_uuid(*removed)],
    )?;
  }
  for added in after.difference(before) {
    conn.execute(
      "INSERT INTO entry_likes (entry_id, user_id, liked_at) VALUES (?1, ?2, ?3)",
      rusqlite::params![entry_id, encode_uuid(*added), at],
    )?;
  }
  Ok(())
}

/// Read, mutate and write back one entry inside `tx` without committing.
fn apply_in_tx<F>(
  tx: &rusqlite::Transaction<'_>,
  entry_id: Uuid,
  apply: F,
) -> Result<EntryChange>
where
  F: FnOnce(&mut ReflectionEntry) -> reflect_core::Result<()>,
{
  let id_str = encode_uuid(entry_id);

  let before =
    load_entry(tx, &id_str)?.ok_or(reflect_core::Error::EntryNotFound(entry_id))?;
  let mut after = before.clone();
  apply(&mut after)?;
  after.updated_at = Utc::now();
  after.check_update_from(&before)?;

  let updated_at_str = encode_dt(after.updated_at);
  tx.execute(
    "UPDATE entries SET
       title = ?2, body = ?3, photo_ref = ?4, visibility = ?5,
       classroom_id = ?6, feedback_state = ?7, updated_at = ?8
     WHERE entry_id = ?1",
    rusqlite::params![
      id_str,
      after.title,
      after.body,
      after.photo_ref.as_ref().map(|p| p.as_str().to_owned()),
      after.visibility.discriminant(),
      after.visibility.classroom_id().map(encode_uuid),
      after.feedback_state.discriminant(),
      updated_at_str,
    ],
  )?;
  sync_likes(tx, &id_str, &before.liked_by, &after.liked_by, &updated_at_str)?;

  Ok(EntryChange { before, after })
}

fn modify_in_tx<F>(
  conn: &mut rusqlite::Connection,
  entry_id: Uuid,
  apply: F,
) -> Result<EntryChange>
where
  F: FnOnce(&mut ReflectionEntry) -> reflect_core::Result<()>,
{
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  // Dropping `tx` on any early return rolls everything back.
  let change = apply_in_tx(&tx, entry_id, apply)?;
  tx.commit()?;
  Ok(change)
}

/// Advance the entry and insert its feedback row in one transaction.
fn feedback_in_tx<F>(
  conn: &mut rusqlite::Connection,
  feedback: &Feedback,
  apply: F,
) -> Result<EntryChange>
where
  F: FnOnce(&mut ReflectionEntry) -> reflect_core::Result<()>,
{
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let change = apply_in_tx(&tx, feedback.entry_id, apply)?;
  tx.execute(
    "INSERT INTO feedback (entry_id, teacher_id, content, given_at)
     VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![
      encode_uuid(feedback.entry_id),
      encode_uuid(feedback.teacher_id),
      feedback.content,
      encode_dt(feedback.given_at),
    ],
  )?;
  tx.commit()?;
  Ok(change)
}

fn delete_in_tx(conn: &mut rusqlite::Connection, entry_id: Uuid) -> Result<Option<ReflectionEntry>> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let id_str = encode_uuid(entry_id);

  let Some(entry) = load_entry(&tx, &id_str)? else {
    return Ok(None);
  };
  tx.execute("DELETE FROM entry_likes WHERE entry_id = ?1", rusqlite::params![id_str])?;
  tx.execute("DELETE FROM feedback WHERE entry_id = ?1", rusqlite::params![id_str])?;
  tx.execute("DELETE FROM entries WHERE entry_id = ?1", rusqlite::params![id_str])?;
  tx.commit()?;

  Ok(Some(entry))
}

// ─── EntryStore impl ─────────────────────────────────────────────────────────

impl EntryStore for SqliteStore {
  type Error = crate::Error;

  async fn insert_entry(&self, input: NewEntry) -> Result<ReflectionEntry> {
    let entry = input.into_entry(Uuid::new_v4(), Utc::now());
    let row = entry.clone();

    self
      .conn
      .call(move |conn| Ok(insert_entry_row(conn, &row)))
      .await??;

    Ok(entry)
  }

  async fn get_entry(&self, entry_id: Uuid) -> Result<Option<ReflectionEntry>> {
    let id_str = encode_uuid(entry_id);
    self.conn.call(move |conn| Ok(load_entry(conn, &id_str))).await?
  }

  async fn modify_entry<F>(&self, entry_id: Uuid, apply: F) -> Result<EntryChange>
  where
    F: FnOnce(&mut ReflectionEntry) -> reflect_core::Result<()> + Send + 'static,
  {
    let change = self
      .conn
      .call(move |conn| Ok(modify_in_tx(conn, entry_id, apply)))
      .await??;
    debug!(entry = %entry_id, "entry modified");
    Ok(change)
  }

  async fn delete_entry(&self, entry_id: Uuid) -> Result<Option<ReflectionEntry>> {
    self.conn.call(move |conn| Ok(delete_in_tx(conn, entry_id))).await?
  }

  async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<ReflectionEntry>> {
    let id_str = encode_uuid(author_id);
    self
      .conn
      .call(move |conn| {
        Ok(load_entries(
          conn,
          &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE author_id = ?1 ORDER BY rowid"),
          rusqlite::params![id_str],
        ))
      })
      .await?
  }

  async fn list_published_in(&self, classroom_id: Uuid) -> Result<Vec<ReflectionEntry>> {
    let id_str = encode_uuid(classroom_id);
    self
      .conn
      .call(move |conn| {
        Ok(load_entries(
          conn,
          &format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE classroom_id = ?1 ORDER BY rowid"
          ),
          rusqlite::params![id_str],
        ))
      })
      .await?
  }

  async fn list_feedback_requested(
    &self,
    classroom_ids: &[Uuid],
  ) -> Result<Vec<ReflectionEntry>> {
    if classroom_ids.is_empty() {
      return Ok(Vec::new());
    }
    let ids: Vec<String> = classroom_ids.iter().copied().map(encode_uuid).collect();
    let placeholders = (1..=ids.len())
      .map(|i| format!("?{i}"))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!(
      "SELECT {ENTRY_COLUMNS} FROM entries
       WHERE feedback_state != 'not_requested'
         AND classroom_id IN ({placeholders})
       ORDER BY rowid"
    );

    self
      .conn
      .call(move |conn| Ok(load_entries(conn, &sql, rusqlite::params_from_iter(ids))))
      .await?
  }
}

// ─── FeedbackStore impl ──────────────────────────────────────────────────────

impl FeedbackStore for SqliteStore {
  async fn record_feedback<F>(
    &self,
    feedback: Feedback,
    apply: F,
  ) -> reflect_core::Result<(EntryChange, Feedback)>
  where
    F: FnOnce(&mut ReflectionEntry) -> reflect_core::Result<()> + Send + 'static,
  {
    self.feedback_tx(feedback, apply).await.map_err(Into::into)
  }

  async fn get_feedback(&self, entry_id: Uuid) -> reflect_core::Result<Option<Feedback>> {
    self.feedback_row(entry_id).await.map_err(Into::into)
  }
}
