//! Version lifecycle engine
//!
//! Write-side operations over the bucket: upload a staged release tree,
//! activate a version by copying its pointer documents onto the root
//! keys, and delete a retired version. Preconditions (version exists, is
//! not active) are validated against the registry before any mutation;
//! the store offers no multi-key transaction, so activation is a sequence
//! of idempotent copies and readers may observe a mix of old and new
//! pointer documents mid-switch. A failed activation is retried by
//! re-invoking it.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::content_type;
use crate::error::{ReleaseError, Result};
use crate::layout;
use crate::manifest::{self, PlannedUpload};
use crate::registry::{Registry, Version};
use crate::store::ObjectStore;
use crate::transform;

/// Outcome of one object push during upload
#[derive(Debug)]
pub struct UploadOutcome {
    pub key: String,
    pub result: Result<()>,
}

/// Per-object results of a best-effort upload
#[derive(Debug, Default)]
pub struct UploadReport {
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadReport {
    pub fn uploaded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.uploaded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &UploadOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    fn record(&mut self, key: String, result: Result<()>) {
        if let Err(e) = &result {
            warn!("Error while uploading {}: {}", key, e);
        }
        self.outcomes.push(UploadOutcome { key, result });
    }
}

/// Result of an activation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The version was already live; nothing was copied
    AlreadyActive,
    /// Pointer documents and the source tree were copied onto the root
    Switched { copied: usize },
}

/// Write-side operations over one bucket
pub struct Lifecycle<'a, S: ObjectStore> {
    store: &'a S,
}

impl<'a, S: ObjectStore> Lifecycle<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Lifecycle { store }
    }

    fn registry(&self) -> Registry<'a, S> {
        Registry::new(self.store)
    }

    fn push_file(&self, source: &Path, key: &str, declared_type: &str, cached: bool) -> Result<()> {
        let data = std::fs::read(source)?;
        let prepared = transform::prepare(&data, declared_type, cached)?;
        debug!(
            "Uploading {} - {}, gzip: {}, cached: {}",
            key,
            declared_type,
            prepared.meta.content_encoding.is_some(),
            cached
        );
        self.store.put(key, &prepared.body, &prepared.meta)
    }

    fn push_planned(&self, planned: &PlannedUpload, report: &mut UploadReport) {
        let result = self.push_file(
            &planned.source,
            &planned.key,
            planned.content_type,
            planned.cached,
        );
        report.record(planned.key.clone(), result);
    }

    /// Upload a staged release tree as `version`.
    ///
    /// Best-effort per object: a failed artifact is recorded in the
    /// report and the walk continues, so a partially populated version
    /// directory is repaired by re-running the upload. Callers decide
    /// whether partial success is acceptable.
    pub fn upload(
        &self,
        version: Version,
        artifact_root: &Path,
        languages: &[String],
    ) -> Result<UploadReport> {
        let mut report = UploadReport::default();

        for artifact in manifest::staged_artifacts(artifact_root) {
            let key = layout::artifact_key(&artifact.relative, version);
            let declared_type = content_type::guess(&artifact.path);
            let result = self.push_file(&artifact.path, &key, declared_type, true);
            report.record(key, result);
        }

        for planned in manifest::pointer_uploads(artifact_root, version) {
            self.push_planned(&planned, &mut report);
        }
        for planned in manifest::aux_uploads(artifact_root, version, languages) {
            self.push_planned(&planned, &mut report);
        }

        info!(
            "Upload of version {} finished: {} objects uploaded, {} failed",
            version,
            report.uploaded(),
            report.failed()
        );
        Ok(report)
    }

    /// Make `version` the live one.
    ///
    /// Copy order is fixed: the three pointer documents, then the
    /// auxiliary root objects, then every key under `<version>/src/`
    /// stripped of its version prefix. Copying the same sources again is
    /// functionally a no-op, so a partial activation is completed by
    /// calling this again.
    pub fn activate(&self, version: Version) -> Result<Activation> {
        let registry = self.registry();
        if !registry.version_exists(version)? {
            return Err(ReleaseError::VersionNotFound(version));
        }
        if registry.active_version()? == version {
            info!("Version {} is already the active version, doing nothing", version);
            return Ok(Activation::AlreadyActive);
        }

        let mut copied = 0;

        for name in layout::POINTER_NAMES {
            let src = layout::pointer_key(name, version);
            let dst = layout::root_pointer_key(name);
            debug!("{} --> {}", src, dst);
            self.store.copy(&src, &dst)?;
            copied += 1;
        }

        for name in layout::AUX_OBJECTS {
            let src = layout::aux_key(version, name);
            debug!("{} --> {}", src, name);
            self.store.copy(&src, name)?;
            copied += 1;
        }

        for object in self.store.list(&layout::src_prefix(version))? {
            if let Some(dst) = layout::strip_version_prefix(&object.key, version) {
                debug!("{} --> {}", object.key, dst);
                self.store.copy(&object.key, &dst)?;
                copied += 1;
            }
        }

        info!("Version {} activated, {} objects copied", version, copied);
        Ok(Activation::Switched { copied })
    }

    /// Delete `version` entirely: its key tree and its pointer documents.
    ///
    /// Refused with [`ActiveVersion`](ReleaseError::ActiveVersion) before
    /// any mutation when the version is live. Returns exactly the keys
    /// the store confirmed as deleted.
    pub fn delete(&self, version: Version) -> Result<Vec<String>> {
        let registry = self.registry();
        if !registry.version_exists(version)? {
            return Err(ReleaseError::VersionNotFound(version));
        }
        if registry.active_version()? == version {
            return Err(ReleaseError::ActiveVersion(version));
        }

        let mut keys: Vec<String> = self
            .store
            .list(&layout::version_prefix(version))?
            .into_iter()
            .map(|object| object.key)
            .collect();
        for name in layout::POINTER_NAMES {
            keys.push(layout::pointer_key(name, version));
        }

        let deleted = self.store.delete(&keys)?;
        info!(
            "Deleted version {}: {} of {} keys confirmed",
            version,
            deleted.len(),
            keys.len()
        );
        Ok(deleted)
    }
}
