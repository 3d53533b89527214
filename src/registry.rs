//! Version registry
//!
//! Read-side queries over the bucket. Versions are not first-class
//! records: a version is known iff objects under its key prefix exist,
//! and the active version is whichever marker the root index document
//! embeds.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{ReleaseError, Result};
use crate::layout;
use crate::marker;
use crate::store::ObjectStore;
use crate::transform;

/// Positive integer identifying one immutable release tree
pub type Version = u32;

/// Sentinel meaning "no version is active"
pub const NO_ACTIVE_VERSION: Version = 0;

/// One known version and when its index pointer was last written
#[derive(Debug, Clone, PartialEq)]
pub struct VersionEntry {
    pub version: Version,
    pub last_modified: DateTime<Utc>,
}

/// Read-side view of the bucket's versions
pub struct Registry<'a, S: ObjectStore> {
    store: &'a S,
}

impl<'a, S: ObjectStore> Registry<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Registry { store }
    }

    /// Resolve the currently active version from the root index document.
    ///
    /// A missing root object or one that is not valid gzip means no
    /// version is active and yields [`NO_ACTIVE_VERSION`] — a deliberate
    /// fallback for a fresh or never-activated bucket, not a swallow of
    /// other errors. A readable root document without a marker is a hard
    /// [`MarkerNotFound`](ReleaseError::MarkerNotFound) error.
    pub fn active_version(&self) -> Result<Version> {
        let body = match self.store.get(layout::ROOT_INDEX) {
            Ok(body) => body,
            Err(ReleaseError::KeyNotFound(_)) => {
                debug!("No root index document, no active version");
                return Ok(NO_ACTIVE_VERSION);
            }
            Err(e) => return Err(e),
        };

        let document = match transform::gunzip(&body) {
            Ok(document) => document,
            Err(ReleaseError::Decompression { source }) => {
                debug!("Root index document is not gzip ({}), no active version", source);
                return Ok(NO_ACTIVE_VERSION);
            }
            Err(e) => return Err(e),
        };

        marker::extract_version(&String::from_utf8_lossy(&document))
            .ok_or_else(|| ReleaseError::MarkerNotFound(layout::ROOT_INDEX.to_string()))
    }

    /// Enumerate known versions from their `index.<version>.html` keys.
    ///
    /// Order is the store's listing order; callers must not assume more
    /// than "stable for a given store state".
    pub fn list_versions(&self) -> Result<Vec<VersionEntry>> {
        Ok(self
            .store
            .list("index")?
            .into_iter()
            .filter_map(|object| {
                layout::parse_index_key(&object.key).map(|version| VersionEntry {
                    version,
                    last_modified: object.last_modified,
                })
            })
            .collect())
    }

    /// Whether any object for `version` exists in the bucket.
    ///
    /// Matches exact path segments (the `<version>/` tree or the
    /// `index.<version>.html` pointer), never a bare numeric prefix.
    pub fn version_exists(&self, version: Version) -> Result<bool> {
        if !self.store.list(&layout::version_prefix(version))?.is_empty() {
            return Ok(true);
        }
        Ok(!self
            .store
            .list(&layout::pointer_key("index", version))?
            .is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Acl, MemoryStore, ObjectMeta};

    fn html_meta() -> ObjectMeta {
        ObjectMeta {
            content_type: "text/html".to_string(),
            content_encoding: Some("gzip".to_string()),
            cache_control: transform::NO_CACHE.to_string(),
            expires: None,
            acl: Acl::PublicRead,
        }
    }

    fn put_gzipped_index(store: &MemoryStore, key: &str, body: &str) {
        let compressed = transform::gzip(body.as_bytes()).unwrap();
        store.put(key, &compressed, &html_meta()).unwrap();
    }

    #[test]
    fn test_active_version_from_marker() {
        let store = MemoryStore::new();
        put_gzipped_index(&store, "index.html", "<html>version: '7'</html>");

        let registry = Registry::new(&store);
        assert_eq!(registry.active_version().unwrap(), 7);
    }

    #[test]
    fn test_empty_store_has_no_active_version() {
        let store = MemoryStore::new();
        let registry = Registry::new(&store);
        assert_eq!(registry.active_version().unwrap(), NO_ACTIVE_VERSION);
    }

    #[test]
    fn test_non_gzip_root_is_treated_as_no_active_version() {
        let store = MemoryStore::new();
        store
            .put("index.html", b"plain, not gzip", &html_meta())
            .unwrap();

        let registry = Registry::new(&store);
        assert_eq!(registry.active_version().unwrap(), NO_ACTIVE_VERSION);
    }

    #[test]
    fn test_markerless_root_is_an_error() {
        let store = MemoryStore::new();
        put_gzipped_index(&store, "index.html", "<html>no marker</html>");

        let registry = Registry::new(&store);
        assert!(matches!(
            registry.active_version(),
            Err(ReleaseError::MarkerNotFound(_))
        ));
    }

    #[test]
    fn test_list_versions_parses_index_keys() {
        let store = MemoryStore::new();
        put_gzipped_index(&store, "index.12.html", "version: '12'");
        put_gzipped_index(&store, "index.13.html", "version: '13'");
        put_gzipped_index(&store, "index.html", "version: '12'");
        store.put("indexing-notes.txt", b"x", &html_meta()).unwrap();

        let registry = Registry::new(&store);
        let versions: Vec<Version> = registry
            .list_versions()
            .unwrap()
            .into_iter()
            .map(|e| e.version)
            .collect();
        assert_eq!(versions, vec![12, 13]);
    }

    #[test]
    fn test_version_exists_requires_exact_segment() {
        let store = MemoryStore::new();
        store.put("120/app.css", b"x", &html_meta()).unwrap();

        let registry = Registry::new(&store);
        assert!(registry.version_exists(120).unwrap());
        assert!(!registry.version_exists(12).unwrap());
    }

    #[test]
    fn test_version_exists_via_pointer_key_alone() {
        let store = MemoryStore::new();
        put_gzipped_index(&store, "index.9.html", "version: '9'");

        let registry = Registry::new(&store);
        assert!(registry.version_exists(9).unwrap());
    }
}
