//! Handlers for `/reflections/:id/photo`.
//!
//! Uploads are the raw image bytes with the image media type as
//! `Content-Type`. Downloads carry an `ETag` and honour `If-None-Match`.

use axum::{
  Json,
  body::Body,
  extract::{Path, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use bytes::Bytes;
use reflect_core::entry::ReflectionEntry;
use uuid::Uuid;

use crate::{
  AppState,
  auth::Actor,
  error::Error,
  etag::{compute_etag, if_none_match},
};

/// `GET /reflections/:id/photo`
pub async fn download(
  State(state): State<AppState>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Response, Error> {
  let asset = state
    .journal
    .photo(&actor, id)
    .await?
    .ok_or_else(|| Error::NotFound(format!("reflection {id} has no photo")))?;

  let etag = compute_etag(&asset.data);
  if if_none_match(&headers, &etag) {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }

  Ok(
    (
      [
        (header::CONTENT_TYPE, asset.media_type),
        (header::ETAG, etag),
        (header::CACHE_CONTROL, "private, no-cache".to_owned()),
      ],
      Body::from(asset.data),
    )
      .into_response(),
  )
}

/// `PUT /reflections/:id/photo`
pub async fn upload(
  State(state): State<AppState>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Json<ReflectionEntry>, Error> {
  let media_type = headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .ok_or_else(|| Error::BadRequest("Content-Type is required".to_owned()))?
    .to_owned();

  let entry = state.journal.set_photo(&actor, id, body.to_vec(), media_type).await?;
  Ok(Json(entry))
}

/// `DELETE /reflections/:id/photo`
pub async fn remove(
  State(state): State<AppState>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<ReflectionEntry>, Error> {
  Ok(Json(state.journal.remove_photo(&actor, id).await?))
}
