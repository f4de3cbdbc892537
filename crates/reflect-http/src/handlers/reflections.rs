//! Handlers for `/reflections` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/reflections` | Body: `{"title":..,"body":..}`; 201 |
//! | `GET`    | `/reflections` | Own entries; `?text=..&sort=stored\|newest\|oldest` |
//! | `GET`    | `/reflections/:id` | Anyone who may view the entry |
//! | `PUT`    | `/reflections/:id` | Author only; see [`EditBody`] |
//! | `DELETE` | `/reflections/:id` | Author only |
//! | `POST`   | `/reflections/:id/like` | Toggles the caller's like |
//! | `POST`   | `/reflections/:id/feedback-request` | Author only |
//! | `GET`    | `/reflections/classroom/:id/public` | Classroom members |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use reflect_core::{
  entry::{EntryPatch, ReflectionEntry},
  likes::LikeOutcome,
  query::{EntryFilter, EntryView},
  visibility::VisibilityRequest,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::Actor, error::Error};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub body:  String,
}

/// `POST /reflections`
pub async fn create(
  State(state): State<AppState>,
  Actor(actor): Actor,
  Json(input): Json<CreateBody>,
) -> Result<impl IntoResponse, Error> {
  let entry = state.journal.create(&actor, input.title, input.body).await?;
  Ok((StatusCode::CREATED, Json(entry)))
}

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /reflections[?text=..&sort=..]`
pub async fn list_own(
  State(state): State<AppState>,
  Actor(actor): Actor,
  Query(filter): Query<EntryFilter>,
) -> Result<Json<Vec<EntryView>>, Error> {
  Ok(Json(state.journal.list_own(&actor, &filter).await?))
}

/// `GET /reflections/:id`
pub async fn get_one(
  State(state): State<AppState>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<EntryView>, Error> {
  Ok(Json(state.journal.get(&actor, id).await?))
}

/// `GET /reflections/classroom/:id/public[?text=..&sort=..]`
pub async fn list_classroom(
  State(state): State<AppState>,
  Actor(actor): Actor,
  Path(classroom_id): Path<Uuid>,
  Query(filter): Query<EntryFilter>,
) -> Result<Json<Vec<EntryView>>, Error> {
  Ok(Json(state.journal.list_classroom_public(&actor, classroom_id, &filter).await?))
}

// ─── Edit ─────────────────────────────────────────────────────────────────────

/// Edit form. Every present field is applied in one atomic mutation.
///
/// Visibility is only touched when `public` is present: `false` makes the
/// entry private, `true` publishes it into `classroom_id` (or keeps its
/// current classroom) with the given `anonymous` flag.
#[derive(Debug, Default, Deserialize)]
pub struct EditBody {
  pub title:            Option<String>,
  pub body:             Option<String>,
  pub public:           Option<bool>,
  pub anonymous:        Option<bool>,
  pub classroom_id:     Option<Uuid>,
  #[serde(default)]
  pub request_feedback: bool,
  #[serde(default)]
  pub remove_photo:     bool,
}

impl TryFrom<EditBody> for EntryPatch {
  type Error = Error;

  fn try_from(body: EditBody) -> Result<Self, Self::Error> {
    let visibility = match body.public {
      Some(public) => Some(VisibilityRequest {
        public,
        anonymous: body.anonymous.unwrap_or(false),
        classroom_id: body.classroom_id,
      }),
      None if body.anonymous.is_some() || body.classroom_id.is_some() => {
        return Err(Error::BadRequest(
          "`anonymous` and `classroom_id` require `public`".to_owned(),
        ));
      }
      None => None,
    };
    Ok(EntryPatch {
      title: body.title,
      body: body.body,
      remove_photo: body.remove_photo,
      visibility,
      request_feedback: body.request_feedback,
    })
  }
}

/// `PUT /reflections/:id`
pub async fn edit(
  State(state): State<AppState>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<EditBody>,
) -> Result<Json<ReflectionEntry>, Error> {
  let patch = EntryPatch::try_from(body)?;
  Ok(Json(state.journal.edit(&actor, id, patch).await?))
}

/// `DELETE /reflections/:id`; responds with the removed entry.
pub async fn delete(
  State(state): State<AppState>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<ReflectionEntry>, Error> {
  Ok(Json(state.journal.delete(&actor, id).await?))
}

// ─── Interactions ─────────────────────────────────────────────────────────────

/// `POST /reflections/:id/like`
pub async fn toggle_like(
  State(state): State<AppState>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<LikeOutcome>, Error> {
  Ok(Json(state.journal.toggle_like(&actor, id).await?))
}

/// `POST /reflections/:id/feedback-request`
pub async fn request_feedback(
  State(state): State<AppState>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<ReflectionEntry>, Error> {
  Ok(Json(state.journal.request_feedback(&actor, id).await?))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn edit_body_without_public_leaves_visibility_alone() {
    let patch = EntryPatch::try_from(EditBody {
      title: Some("T".into()),
      request_feedback: true,
      ..EditBody::default()
    })
    .unwrap();
    assert!(patch.visibility.is_none());
    assert!(patch.request_feedback);
  }

  #[test]
  fn edit_body_publish_fields() {
    let c = Uuid::new_v4();
    let patch = EntryPatch::try_from(EditBody {
      public: Some(true),
      anonymous: Some(true),
      classroom_id: Some(c),
      ..EditBody::default()
    })
    .unwrap();
    assert_eq!(patch.visibility, Some(VisibilityRequest::publish(c, true)));
  }

  #[test]
  fn anonymity_without_public_is_rejected() {
    let result = EntryPatch::try_from(EditBody {
      anonymous: Some(true),
      ..EditBody::default()
    });
    assert!(matches!(result, Err(Error::BadRequest(_))));
  }
}
