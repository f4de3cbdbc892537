//! Photos stored as plain files in one directory.

use std::{io, path::PathBuf};

use reflect_core::{
  Error, Result,
  assets::{Asset, AssetStore, PhotoRef},
};
use tracing::debug;
use uuid::Uuid;

/// Supported photo media types and the file extensions they are stored under.
const MEDIA_TYPES: &[(&str, &str)] = &[
  ("image/jpeg", "jpg"),
  ("image/png", "png"),
  ("image/gif", "gif"),
  ("image/webp", "webp"),
];

fn extension_for(media_type: &str) -> Option<&'static str> {
  // Ignore parameters such as `; charset=...`.
  let essence = media_type.split(';').next().unwrap_or_default().trim();
  MEDIA_TYPES
    .iter()
    .find(|(mt, _)| mt.eq_ignore_ascii_case(essence))
    .map(|(_, ext)| *ext)
}

fn media_type_for(extension: &str) -> Option<&'static str> {
  MEDIA_TYPES.iter().find(|(_, ext)| *ext == extension).map(|(mt, _)| *mt)
}

/// An [`AssetStore`] writing each upload to `<root>/<uuid>.<ext>`.
#[derive(Debug, Clone)]
pub struct DiskAssetStore {
  root: PathBuf,
}

impl DiskAssetStore {
  /// Use `root` as the photo directory, creating it if needed.
  pub async fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
    let root = root.into();
    tokio::fs::create_dir_all(&root).await?;
    Ok(Self { root })
  }

  /// Resolve a reference to a path inside the root. References that could
  /// escape the directory are rejected.
  fn path_of(&self, photo: &PhotoRef) -> Option<(PathBuf, &'static str)> {
    let name = photo.as_str();
    let (stem, ext) = name.rsplit_once('.')?;
    Uuid::parse_str(stem).ok()?;
    let media_type = media_type_for(ext)?;
    Some((self.root.join(name), media_type))
  }
}

impl AssetStore for DiskAssetStore {
  async fn store(&self, data: Vec<u8>, media_type: String) -> Result<PhotoRef> {
    let ext = extension_for(&media_type).ok_or_else(|| {
      Error::validation(format!("unsupported photo type: {media_type}"))
    })?;
    let photo = PhotoRef::new(format!("{}.{ext}", Uuid::new_v4()));
    tokio::fs::write(self.root.join(photo.as_str()), &data)
      .await
      .map_err(Error::backend)?;
    debug!(photo = %photo, bytes = data.len(), "photo stored");
    Ok(photo)
  }

  async fn load<'a>(&'a self, photo: &'a PhotoRef) -> Result<Option<Asset>> {
    let Some((path, media_type)) = self.path_of(photo) else {
      return Ok(None);
    };
    match tokio::fs::read(&path).await {
      Ok(data) => Ok(Some(Asset { data, media_type: media_type.to_owned() })),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(Error::backend(e)),
    }
  }

  async fn delete(&self, photo: PhotoRef) -> Result<()> {
    let Some((path, _)) = self.path_of(&photo) else {
      return Ok(());
    };
    match tokio::fs::remove_file(&path).await {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(Error::backend(e)),
    }
  }
}
