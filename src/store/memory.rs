//! In-memory object store
//!
//! Backs the test suite and doubles as a spy: every trait call bumps a
//! counter so tests can assert that a refused operation issued zero
//! mutations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::error::{ReleaseError, Result};
use crate::store::{ListedObject, ObjectMeta, ObjectStore};

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    meta: ObjectMeta,
    last_modified: DateTime<Utc>,
}

/// Number of trait calls issued per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub puts: usize,
    pub gets: usize,
    pub lists: usize,
    pub copies: usize,
    pub deletes: usize,
}

/// Keyed blob store held entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    calls: Mutex<StoreCalls>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes stored under `key`, if any
    pub fn body(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().get(key).map(|o| o.body.clone())
    }

    /// Metadata stored under `key`, if any
    pub fn meta(&self, key: &str) -> Option<ObjectMeta> {
        self.objects.lock().get(key).map(|o| o.meta.clone())
    }

    /// All keys currently present, in lexicographic order
    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().keys().cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().contains_key(key)
    }

    /// Call counters recorded so far
    pub fn calls(&self) -> StoreCalls {
        *self.calls.lock()
    }
}

impl ObjectStore for MemoryStore {
    fn put(&self, key: &str, body: &[u8], meta: &ObjectMeta) -> Result<()> {
        self.calls.lock().puts += 1;
        self.objects.lock().insert(
            key.to_string(),
            StoredObject {
                body: body.to_vec(),
                meta: meta.clone(),
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.calls.lock().gets += 1;
        self.objects
            .lock()
            .get(key)
            .map(|o| o.body.clone())
            .ok_or_else(|| ReleaseError::KeyNotFound(key.to_string()))
    }

    fn list(&self, prefix: &str) -> Result<Vec<ListedObject>> {
        self.calls.lock().lists += 1;
        Ok(self
            .objects
            .lock()
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, obj)| ListedObject {
                key: key.clone(),
                last_modified: obj.last_modified,
            })
            .collect())
    }

    fn copy(&self, src: &str, dst: &str) -> Result<()> {
        self.calls.lock().copies += 1;
        let mut objects = self.objects.lock();
        let mut copied = objects
            .get(src)
            .cloned()
            .ok_or_else(|| ReleaseError::KeyNotFound(src.to_string()))?;
        copied.last_modified = Utc::now();
        objects.insert(dst.to_string(), copied);
        Ok(())
    }

    fn delete(&self, keys: &[String]) -> Result<Vec<String>> {
        self.calls.lock().deletes += 1;
        let mut objects = self.objects.lock();
        let mut deleted = Vec::new();
        for key in keys {
            if objects.remove(key).is_some() {
                deleted.push(key.clone());
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Acl;

    fn meta() -> ObjectMeta {
        ObjectMeta {
            content_type: "text/plain".to_string(),
            content_encoding: None,
            cache_control: "no-cache".to_string(),
            expires: None,
            acl: Acl::PublicRead,
        }
    }

    #[test]
    fn test_put_get_roundtrip() {
        let store = MemoryStore::new();
        store.put("a/file.txt", b"hello", &meta()).unwrap();

        assert_eq!(store.get("a/file.txt").unwrap(), b"hello");
        assert!(matches!(
            store.get("missing"),
            Err(ReleaseError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_list_is_prefix_scoped() {
        let store = MemoryStore::new();
        store.put("12/app.css", b"x", &meta()).unwrap();
        store.put("12/img/logo.png", b"x", &meta()).unwrap();
        store.put("120/app.css", b"x", &meta()).unwrap();

        let keys: Vec<String> = store
            .list("12/")
            .unwrap()
            .into_iter()
            .map(|o| o.key)
            .collect();
        assert_eq!(keys, vec!["12/app.css", "12/img/logo.png"]);
    }

    #[test]
    fn test_copy_preserves_body_and_meta() {
        let store = MemoryStore::new();
        store.put("src.html", b"content", &meta()).unwrap();
        store.copy("src.html", "dst.html").unwrap();

        assert_eq!(store.get("dst.html").unwrap(), b"content");
        assert_eq!(store.meta("dst.html"), Some(meta()));

        assert!(matches!(
            store.copy("missing", "x"),
            Err(ReleaseError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_delete_reports_only_removed_keys() {
        let store = MemoryStore::new();
        store.put("one", b"1", &meta()).unwrap();
        store.put("two", b"2", &meta()).unwrap();

        let deleted = store
            .delete(&["one".to_string(), "missing".to_string()])
            .unwrap();
        assert_eq!(deleted, vec!["one"]);
        assert!(store.contains("two"));
    }

    #[test]
    fn test_call_counters() {
        let store = MemoryStore::new();
        store.put("k", b"v", &meta()).unwrap();
        let _ = store.get("k");
        let _ = store.list("");
        assert_eq!(
            store.calls(),
            StoreCalls {
                puts: 1,
                gets: 1,
                lists: 1,
                copies: 0,
                deletes: 0,
            }
        );
    }
}
