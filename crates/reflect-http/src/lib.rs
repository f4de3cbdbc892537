//! JSON HTTP API for the reflection journal.
//!
//! Exposes an axum [`Router`] over a [`Journal`] backed by SQLite and a photo
//! directory. Every route requires HTTP Basic credentials of a registered
//! user.

pub mod assets;
pub mod auth;
pub mod error;
pub mod etag;
pub mod handlers;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use reflect_core::Journal;
use reflect_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use assets::DiskAssetStore;
use handlers::{feedback, photos, reflections};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `REFLECT_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub store_path:      PathBuf,
  pub asset_dir:       PathBuf,
  /// Upper bound on any request body, photo uploads included.
  pub max_photo_bytes: usize,
}

// ─── Application state ────────────────────────────────────────────────────────

pub type AppJournal = Journal<SqliteStore, DiskAssetStore>;

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState {
  pub journal: AppJournal,
  pub config:  Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the journal API.
pub fn router(state: AppState) -> Router {
  let body_limit = state.config.max_photo_bytes;
  Router::new()
    // Reflections
    .route("/reflections", get(reflections::list_own).post(reflections::create))
    .route(
      "/reflections/{id}",
      get(reflections::get_one).put(reflections::edit).delete(reflections::delete),
    )
    .route("/reflections/{id}/like", post(reflections::toggle_like))
    .route("/reflections/{id}/feedback-request", post(reflections::request_feedback))
    .route(
      "/reflections/{id}/photo",
      get(photos::download).put(photos::upload).delete(photos::remove),
    )
    .route("/reflections/classroom/{id}/public", get(reflections::list_classroom))
    // Feedback
    .route("/feedback/student-requested-feedback", get(feedback::list_requests))
    .route("/feedback/{id}", get(feedback::get_one).post(feedback::give))
    .layer(DefaultBodyLimit::max(body_limit))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
