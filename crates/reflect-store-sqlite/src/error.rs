//! Error type for `reflect-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain rejection raised while applying a mutation.
  #[error(transparent)]
  Core(#[from] reflect_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column holds a value the decoder does not recognise.
  #[error("corrupt column {column}: {value:?}")]
  Corrupt {
    column: &'static str,
    value:  String,
  },

  #[error("user not found: {0}")]
  UserNotFound(String),

  #[error("username already taken: {0}")]
  UsernameTaken(String),
}

/// Domain errors pass through unchanged; everything else is opaque to the
/// engine.
impl From<Error> for reflect_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Core(e) => e,
      other => reflect_core::Error::backend(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
