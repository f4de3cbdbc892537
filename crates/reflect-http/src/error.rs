//! API error type and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use reflect_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error(transparent)]
  Core(#[from] CoreError),
}

impl From<reflect_store_sqlite::Error> for Error {
  fn from(err: reflect_store_sqlite::Error) -> Self { Self::Core(err.into()) }
}

impl Error {
  pub fn status(&self) -> StatusCode {
    match self {
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::Core(e) => match e {
        CoreError::Validation(_) | CoreError::InvalidTransition(_) => {
          StatusCode::BAD_REQUEST
        }
        CoreError::Forbidden(_) | CoreError::InvalidClassroom(_) => StatusCode::FORBIDDEN,
        CoreError::EntryNotFound(_) | CoreError::ClassroomNotFound(_) => {
          StatusCode::NOT_FOUND
        }
        CoreError::InvalidState { .. } | CoreError::Conflict(_) => StatusCode::CONFLICT,
        CoreError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(error = %self, "request failed");
    }
    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if matches!(self, Error::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"reflect\""),
      );
    }
    res
  }
}
