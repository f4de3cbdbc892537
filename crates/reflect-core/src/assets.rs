//! Binary asset storage for entry photos.
//!
//! No image data lives in the entry store; entries only hold a [`PhotoRef`]
//! into an [`AssetStore`].

use std::{fmt, future::Future};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Opaque reference to a stored photo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(String);

impl PhotoRef {
  pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for PhotoRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// A photo loaded back out of the store.
#[derive(Debug, Clone)]
pub struct Asset {
  pub data:       Vec<u8>,
  pub media_type: String,
}

pub trait AssetStore: Send + Sync {
  /// Persist `data` and return a fresh reference to it. Every call yields a
  /// distinct reference, so deleting one entry's photo never affects another.
  fn store(
    &self,
    data: Vec<u8>,
    media_type: String,
  ) -> impl Future<Output = Result<PhotoRef>> + Send + '_;

  /// Load a stored photo. Returns `None` if the reference is unknown.
  fn load<'a>(
    &'a self,
    photo: &'a PhotoRef,
  ) -> impl Future<Output = Result<Option<Asset>>> + Send + 'a;

  /// Remove a stored photo. Unknown references are not an error.
  fn delete(&self, photo: PhotoRef) -> impl Future<Output = Result<()>> + Send + '_;
}
