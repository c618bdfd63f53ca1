//! ETags for tontine resources.
//!
//! An ETag is the SHA-256 of the tontine's JSON form. Maps serialise in key
//! order, so equal tontines always hash the same.

use axum::http::{HeaderMap, header};
use sha2::{Digest, Sha256};
use tontine_core::tontine::Tontine;

use crate::error::ApiError;

/// Compute the quoted ETag of `tontine`.
pub fn compute_etag(tontine: &Tontine) -> Result<String, ApiError> {
  let bytes = serde_json::to_vec(tontine).map_err(|e| ApiError::Store(Box::new(e)))?;
  let hash = Sha256::digest(&bytes);
  Ok(format!("\"{}\"", hex::encode(hash)))
}

/// Whether the request's `If-Match` header (if any) admits `current`.
///
/// No header means no precondition. `*` matches anything. Otherwise one of
/// the listed tags must equal `current`, quotes and weak prefixes ignored.
pub fn if_match(headers: &HeaderMap, current: &str) -> bool {
  let Some(value) = headers.get(header::IF_MATCH).and_then(|v| v.to_str().ok()) else {
    return true;
  };
  let current = strip_etag(current);
  value
    .split(',')
    .map(str::trim)
    .any(|tag| tag == "*" || strip_etag(tag) == current)
}

fn strip_etag(s: &str) -> &str { s.trim_start_matches("W/").trim_matches('"') }
