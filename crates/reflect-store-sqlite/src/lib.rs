//! SQLite backend for the reflection journal.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Besides entries, the same database holds
//! the users, classrooms and feedback text the engine consults as
//! collaborators.

mod directory;
mod encode;
mod schema;
mod store;

pub mod error;

pub use directory::UserRecord;
pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
