//! Core types, state machines and trait definitions for the reflection
//! journal.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`store::EntryStore`] and friends; the HTTP layer drives
//! everything through [`journal::Journal`].

pub mod assets;
pub mod directory;
pub mod entry;
pub mod error;
pub mod feedback;
pub mod guard;
pub mod journal;
pub mod likes;
pub mod query;
pub mod store;
pub mod visibility;

pub use error::{Error, Result};
pub use journal::Journal;
