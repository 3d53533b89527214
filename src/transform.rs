//! Per-object transform applied before upload
//!
//! Decides compression and cache headers for each artifact. Text-like
//! content is gzip-compressed at a fixed level; already-compressed image
//! and font formats are stored verbatim. Cache policy is binary:
//! content-addressed artifacts live under a versioned path and never
//! change, so they get a year-long public cache, while pointer and
//! manifest documents must always be revalidated and additionally carry
//! an `Expires` date far in the past.

use std::io::{Read, Write};

use chrono::{DateTime, TimeDelta, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{ReleaseError, Result};
use crate::store::{Acl, ObjectMeta};

/// Content types stored without compression
const NO_COMPRESS: [&str; 6] = [
    "image/png",
    "image/jpeg",
    "image/ico",
    "application/x-font-ttf",
    "application/x-font-opentype",
    "application/vnd.ms-fontobject",
];

/// Cache header for immutable, versioned artifacts
pub const CACHE_FOREVER: &str = "max-age=31536000, public";

/// Cache header for pointer/index documents that must be revalidated
pub const NO_CACHE: &str = "no-cache, no-store, max-age=0, must-revalidate";

/// Gzip level used by the deployed site (matches already-stored objects)
const GZIP_LEVEL: u32 = 5;

/// Epoch seconds of the fixed stale `Expires` date, 1990-01-01T00:00:00Z
const STALE_EPOCH_SECS: i64 = 631_152_000;

/// Bytes and headers ready for the store adapter
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedObject {
    pub body: Vec<u8>,
    pub meta: ObjectMeta,
}

/// The fixed past `Expires` date attached to uncached objects
pub fn stale_expiry() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH + TimeDelta::seconds(STALE_EPOCH_SECS)
}

/// Whether a content type is in the incompressible set
pub fn is_compressible(content_type: &str) -> bool {
    !NO_COMPRESS.contains(&content_type)
}

/// Gzip-compress `data` at the site's fixed level.
///
/// A failure here must abort the upload of this one object; the transform
/// never falls back to storing partial output.
pub fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(GZIP_LEVEL));
    encoder
        .write_all(data)
        .map_err(|source| ReleaseError::Compression { source })?;
    encoder
        .finish()
        .map_err(|source| ReleaseError::Compression { source })
}

/// Decompress gzip-framed `data`.
///
/// Rejects input that is not valid gzip with a
/// [`Decompression`](ReleaseError::Decompression) error, a distinct kind
/// from a missing key.
pub fn gunzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|source| ReleaseError::Decompression { source })?;
    Ok(out)
}

/// Produce the bytes and headers to store for one artifact.
pub fn prepare(data: &[u8], content_type: &str, cached: bool) -> Result<PreparedObject> {
    let (body, content_encoding) = if is_compressible(content_type) {
        (gzip(data)?, Some("gzip".to_string()))
    } else {
        (data.to_vec(), None)
    };

    let (cache_control, expires) = if cached {
        (CACHE_FOREVER.to_string(), None)
    } else {
        (NO_CACHE.to_string(), Some(stale_expiry()))
    };

    Ok(PreparedObject {
        body,
        meta: ObjectMeta {
            content_type: content_type.to_string(),
            content_encoding,
            cache_control,
            expires,
            acl: Acl::PublicRead,
        },
    })
}
