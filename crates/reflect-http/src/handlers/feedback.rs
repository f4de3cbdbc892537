//! Handlers for `/feedback` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/feedback/:id` | Teacher of the entry's classroom; body `{"content":..}` |
//! | `GET`  | `/feedback/:id` | Author or teacher; 404 until feedback is given |
//! | `GET`  | `/feedback/student-requested-feedback` | `?text=..&status=all\|given\|not_given` |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use reflect_core::{
  feedback::Feedback,
  query::{EntryFilter, EntryView},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::Actor, error::Error};

#[derive(Debug, Deserialize)]
pub struct GiveBody {
  #[serde(default)]
  pub content: String,
}

/// `POST /feedback/:id`
pub async fn give(
  State(state): State<AppState>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<GiveBody>,
) -> Result<Json<Feedback>, Error> {
  Ok(Json(state.journal.give_feedback(&actor, id, body.content).await?))
}

/// `GET /feedback/:id`
pub async fn get_one(
  State(state): State<AppState>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<Feedback>, Error> {
  let feedback = state
    .journal
    .feedback(&actor, id)
    .await?
    .ok_or_else(|| Error::NotFound(format!("no feedback on reflection {id}")))?;
  Ok(Json(feedback))
}

/// `GET /feedback/student-requested-feedback`
pub async fn list_requests(
  State(state): State<AppState>,
  Actor(actor): Actor,
  Query(filter): Query<EntryFilter>,
) -> Result<Json<Vec<EntryView>>, Error> {
  Ok(Json(state.journal.list_feedback_requests(&actor, &filter).await?))
}
