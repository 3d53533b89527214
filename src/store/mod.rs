//! Object store boundary
//!
//! The release engine treats the bucket as an opaque key-value blob store
//! with list/get/put/copy/delete. [`ObjectStore`] is that boundary; the
//! engine and registry are written against it so tests can substitute
//! [`MemoryStore`] for the real [`S3Store`].

mod memory;
mod s3;

pub use memory::{MemoryStore, StoreCalls};
pub use s3::S3Store;

use chrono::{DateTime, Utc};

use crate::error::Result;

/// Canned access policy applied to written objects
///
/// The bucket serves a public website, so every write and copy carries
/// `public-read`. `Private` exists only so adapters have a non-public
/// mapping to fall back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Acl {
    #[default]
    PublicRead,
    Private,
}

/// Per-object metadata set on upload
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMeta {
    /// `Content-Type` header
    pub content_type: String,
    /// `Content-Encoding` header (`gzip` for compressed objects)
    pub content_encoding: Option<String>,
    /// `Cache-Control` header
    pub cache_control: String,
    /// `Expires` header, set to a fixed past date for uncached objects
    pub expires: Option<DateTime<Utc>>,
    /// Access policy
    pub acl: Acl,
}

/// One entry returned by a prefix listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListedObject {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

/// Blocking key-value view of one bucket
///
/// Timeouts and retries are the adapter's concern; callers see each
/// failure immediately and perform no retries of their own.
pub trait ObjectStore {
    /// Write an object, overwriting any existing one under the same key.
    fn put(&self, key: &str, body: &[u8], meta: &ObjectMeta) -> Result<()>;

    /// Read an object's bytes. Missing keys surface as
    /// [`ReleaseError::KeyNotFound`](crate::ReleaseError::KeyNotFound).
    fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// List all keys starting with `prefix`, in the store's listing order.
    fn list(&self, prefix: &str) -> Result<Vec<ListedObject>>;

    /// Server-side copy of `src` onto `dst`, keeping the public-read policy.
    fn copy(&self, src: &str, dst: &str) -> Result<()>;

    /// Batch delete. Returns the keys the store confirmed as deleted,
    /// which is authoritative over the request list.
    fn delete(&self, keys: &[String]) -> Result<Vec<String>>;
}
