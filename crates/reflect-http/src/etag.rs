//! ETag computation for photo downloads.
//!
//! ETags are quoted SHA-256 hashes of the photo bytes, so re-uploading the
//! same image yields the same tag.

use axum::http::{HeaderMap, header};
use sha2::{Digest, Sha256};

/// Compute a strong ETag for `data`.
pub fn compute_etag(data: &[u8]) -> String {
  let hash = Sha256::digest(data);
  format!("\"{}\"", hex::encode(hash))
}

/// `true` if the request's `If-None-Match` header lists `etag` (or `*`).
///
/// Bare, unquoted tags are accepted too; some clients drop the quotes.
pub fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
  let Some(value) = headers.get(header::IF_NONE_MATCH).and_then(|v| v.to_str().ok())
  else {
    return false;
  };
  let wanted = strip_etag_quotes(etag);
  value
    .split(',')
    .map(str::trim)
    .any(|tag| tag == "*" || strip_etag_quotes(tag.trim_start_matches("W/")) == wanted)
}

fn strip_etag_quotes(tag: &str) -> &str { tag.trim_matches('"') }
