//! Upload manifest
//!
//! What gets uploaded is a fixed, explicit set of build outputs, not a
//! full crawl of the staging directory: the bulk artifact tree, the three
//! pointer documents, and a handful of auxiliary documents with explicit
//! content types. `services` and the per-language `layersConfig` documents
//! are mirrored under both `<version>/` and `<version>/src/` so the
//! versioned tree is self-contained under either access path.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::layout::{self, STAGING_DIR};
use crate::registry::Version;

/// Files and directories uploaded as the bulk artifact tree, relative to
/// the staged root
pub const ARTIFACT_SET: [&str; 8] = [
    "prd/lib/build.js",
    "prd/style/app.css",
    "prd/index.html",
    "prd/img",
    "prd/style",
    "prd/lib",
    "prd/locales",
    "src",
];

/// Extensions never uploaded (build inputs, not outputs)
pub const EXCLUDED_EXTENSIONS: [&str; 1] = ["less"];

/// File names never uploaded as part of the bulk tree; `services` and
/// `checker` are uploaded separately with their own content types
pub const EXCLUDED_NAMES: [&str; 3] = [".gitignore", "services", "checker"];

/// Content type declared by the deployed `services`/`layersConfig` documents
const JS_CONFIG_TYPE: &str = "application/js";

/// One staged file from the bulk artifact tree
#[derive(Debug, Clone, PartialEq)]
pub struct StagedArtifact {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Path relative to the staged root, forward-slash separated
    pub relative: String,
}

/// One explicitly-planned upload (pointer or auxiliary document)
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedUpload {
    pub source: PathBuf,
    pub key: String,
    pub content_type: &'static str,
    pub cached: bool,
}

fn is_excluded(file_name: &str) -> bool {
    let path = Path::new(file_name);
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        if EXCLUDED_EXTENSIONS.contains(&extension) {
            return true;
        }
    }
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    EXCLUDED_NAMES.contains(&stem)
}

fn relative_to(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments: Vec<&str> = relative
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();
    Some(segments.join("/"))
}

/// Collect the bulk artifact tree from a staged root.
///
/// Manifest entries missing on disk are skipped, matching the best-effort
/// upload policy; unreadable directory entries are logged and skipped.
pub fn staged_artifacts(root: &Path) -> Vec<StagedArtifact> {
    let mut artifacts = Vec::new();

    for entry in ARTIFACT_SET {
        let full_path = root.join(entry);
        if full_path.is_file() {
            artifacts.push(StagedArtifact {
                path: full_path,
                relative: entry.to_string(),
            });
        } else if full_path.is_dir() {
            for walked in WalkDir::new(&full_path) {
                let walked = match walked {
                    Ok(w) => w,
                    Err(e) => {
                        warn!("Skipping unreadable entry under {}: {}", entry, e);
                        continue;
                    }
                };
                if !walked.file_type().is_file() {
                    continue;
                }
                let name = walked.file_name().to_string_lossy();
                if is_excluded(&name) {
                    continue;
                }
                if let Some(relative) = relative_to(root, walked.path()) {
                    artifacts.push(StagedArtifact {
                        path: walked.path().to_path_buf(),
                        relative,
                    });
                }
            }
        }
    }

    artifacts
}

/// The three pointer documents, uploaded under version-suffixed names.
pub fn pointer_uploads(root: &Path, version: Version) -> Vec<PlannedUpload> {
    layout::POINTER_NAMES
        .iter()
        .map(|name| PlannedUpload {
            source: root.join(STAGING_DIR).join(format!("{}.html", name)),
            key: layout::pointer_key(name, version),
            content_type: "text/html",
            cached: false,
        })
        .collect()
}

/// Auxiliary documents with explicit content types and cache policies.
pub fn aux_uploads(root: &Path, version: Version, languages: &[String]) -> Vec<PlannedUpload> {
    let staging = root.join(STAGING_DIR);
    let mut plan = Vec::new();

    plan.push(PlannedUpload {
        source: staging.join("cache/services"),
        key: layout::aux_key(version, "services"),
        content_type: JS_CONFIG_TYPE,
        cached: true,
    });
    for lang in languages {
        plan.push(PlannedUpload {
            source: staging.join(format!("cache/layersConfig.{}.json", lang)),
            key: layout::aux_key(version, &format!("layersConfig.{}.json", lang)),
            content_type: JS_CONFIG_TYPE,
            cached: true,
        });
    }

    plan.push(PlannedUpload {
        source: staging.join(format!("geoadmin.{}.appcache", version)),
        key: layout::aux_key(version, "geoadmin.appcache"),
        content_type: "text/cache-manifest",
        cached: false,
    });
    plan.push(PlannedUpload {
        source: staging.join("robots.txt"),
        key: layout::aux_key(version, "robots.txt"),
        content_type: "text/plain",
        cached: false,
    });
    plan.push(PlannedUpload {
        source: staging.join("checker"),
        key: layout::aux_key(version, "checker"),
        content_type: "text/plain",
        cached: false,
    });

    // src/ mirror of the config documents
    plan.push(PlannedUpload {
        source: staging.join("cache/services"),
        key: format!("{}/src/services", version),
        content_type: JS_CONFIG_TYPE,
        cached: true,
    });
    for lang in languages {
        plan.push(PlannedUpload {
            source: staging.join(format!("cache/layersConfig.{}.json", lang)),
            key: format!("{}/src/layersConfig.{}.json", version, lang),
            content_type: JS_CONFIG_TYPE,
            cached: true,
        });
    }

    plan
}
