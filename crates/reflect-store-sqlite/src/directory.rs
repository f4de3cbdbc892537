//! Users and classrooms, as far as the journal needs them.
//!
//! Rosters are only seeded here (see the admin subcommands of the server
//! binary); everything else about classrooms lives outside this system.

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use reflect_core::directory::{ClassroomDirectory, Role};

use crate::{
  Error, Result, SqliteStore,
  encode::{RawUser, decode_role, decode_uuid, encode_dt, encode_uuid},
};

/// A row of the `users` table.
#[derive(Debug, Clone)]
pub struct UserRecord {
  pub user_id:       Uuid,
  pub username:      String,
  pub role:          Role,
  /// argon2 PHC string.
  pub password_hash: String,
}

impl SqliteStore {
  /// Register a user. Fails if the username is taken.
  pub async fn add_user(
    &self,
    username: &str,
    role: Role,
    password_hash: &str,
  ) -> Result<UserRecord> {
    let user = UserRecord {
      user_id:       Uuid::new_v4(),
      username:      username.to_owned(),
      role,
      password_hash: password_hash.to_owned(),
    };

    let id_str   = encode_uuid(user.user_id);
    let name     = user.username.clone();
    let role_str = role.as_str();
    let hash     = user.password_hash.clone();
    let at_str   = encode_dt(Utc::now());

    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT OR IGNORE INTO users (user_id, username, role, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, role_str, hash, at_str],
        )?;
        Ok(n == 1)
      })
      .await?;

    if !inserted {
      return Err(Error::UsernameTaken(username.to_owned()));
    }
    Ok(user)
  }

  pub async fn find_user(&self, username: &str) -> Result<Option<UserRecord>> {
    let name = username.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, username, role, password_hash FROM users WHERE username = ?1",
              rusqlite::params![name],
              |row| {
                Ok(RawUser {
                  user_id:       row.get(0)?,
                  username:      row.get(1)?,
                  role:          row.get(2)?,
                  password_hash: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  /// Create a classroom taught by the user named `teacher`.
  pub async fn add_classroom(&self, title: &str, teacher: &str) -> Result<Uuid> {
    let teacher = self
      .find_user(teacher)
      .await?
      .ok_or_else(|| Error::UserNotFound(teacher.to_owned()))?;
    if teacher.role != Role::Teacher {
      return Err(
        reflect_core::Error::forbidden(format!("{} is not a teacher", teacher.username))
          .into(),
      );
    }

    let classroom_id = Uuid::new_v4();
    let id_str       = encode_uuid(classroom_id);
    let teacher_str  = encode_uuid(teacher.user_id);
    let title        = title.to_owned();
    let at_str       = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO classrooms (classroom_id, title, teacher_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, title, teacher_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(classroom_id)
  }

  /// Enroll a user as a student of a classroom. Enrolling twice is a no-op.
  pub async fn enroll(&self, classroom_id: Uuid, user_id: Uuid) -> Result<()> {
    if !self.classroom_row_exists(classroom_id).await? {
      return Err(reflect_core::Error::ClassroomNotFound(classroom_id).into());
    }
    let classroom_str = encode_uuid(classroom_id);
    let user_str      = encode_uuid(user_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO classroom_students (classroom_id, user_id) VALUES (?1, ?2)",
          rusqlite::params![classroom_str, user_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn classroom_row_exists(&self, classroom_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(classroom_id);
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM classrooms WHERE classroom_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn teacher_of(&self, classroom_id: Uuid) -> Result<Option<Uuid>> {
    let id_str = encode_uuid(classroom_id);
    let teacher: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT teacher_id FROM classrooms WHERE classroom_id = ?1",
              rusqlite::params![id_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    teacher.as_deref().map(decode_uuid).transpose()
  }

  async fn is_enrolled(&self, classroom_id: Uuid, user_id: Uuid) -> Result<bool> {
    let classroom_str = encode_uuid(classroom_id);
    let user_str      = encode_uuid(user_id);
    let enrolled = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM classroom_students WHERE classroom_id = ?1 AND user_id = ?2",
              rusqlite::params![classroom_str, user_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(enrolled)
  }

  async fn taught_by(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
    let user_str = encode_uuid(user_id);
    let ids: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT classroom_id FROM classrooms WHERE teacher_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    ids.iter().map(|s| decode_uuid(s)).collect()
  }

  async fn user_role(&self, user_id: Uuid) -> Result<Option<Role>> {
    let user_str = encode_uuid(user_id);
    let role: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT role FROM users WHERE user_id = ?1",
              rusqlite::params![user_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    role.as_deref().map(decode_role).transpose()
  }
}

// ─── ClassroomDirectory impl ─────────────────────────────────────────────────

impl ClassroomDirectory for SqliteStore {
  async fn classroom_exists(&self, classroom_id: Uuid) -> reflect_core::Result<bool> {
    Ok(self.classroom_row_exists(classroom_id).await?)
  }

  async fn is_member(&self, classroom_id: Uuid, user_id: Uuid) -> reflect_core::Result<bool> {
    if self.teacher_of(classroom_id).await? == Some(user_id) {
      return Ok(true);
    }
    Ok(self.is_enrolled(classroom_id, user_id).await?)
  }

  async fn is_teacher(&self, classroom_id: Uuid, user_id: Uuid) -> reflect_core::Result<bool> {
    Ok(self.teacher_of(classroom_id).await? == Some(user_id))
  }

  async fn classrooms_taught_by(&self, user_id: Uuid) -> reflect_core::Result<Vec<Uuid>> {
    Ok(self.taught_by(user_id).await?)
  }

  async fn role(&self, user_id: Uuid) -> reflect_core::Result<Option<Role>> {
    Ok(self.user_role(user_id).await?)
  }
}
