//! Bucket key layout
//!
//! The naming scheme is persisted state: already-deployed versions in the
//! bucket follow it, so every helper here must stay bit-exact with the
//! deployed layout. Root pointers (`index.html`, `embed.html`,
//! `mobile.html`) name whatever version is live; per-version pointers and
//! the `<version>/...` tree hold each immutable release.

use crate::registry::Version;

/// Root pointer document that embeds the active version's marker
pub const ROOT_INDEX: &str = "index.html";

/// Pointer documents copied onto the root during activation
pub const POINTER_NAMES: [&str; 3] = ["index", "embed", "mobile"];

/// Auxiliary objects copied from `<version>/...` onto the root during
/// activation, in this order
pub const AUX_OBJECTS: [&str; 3] = ["robots.txt", "geoadmin.appcache", "checker"];

/// Name of the build-output directory in a staged artifact tree
pub const STAGING_DIR: &str = "prd";

/// Versioned pointer key, e.g. `index.12.html`
pub fn pointer_key(name: &str, version: Version) -> String {
    format!("{}.{}.html", name, version)
}

/// Root pointer key, e.g. `index.html`
pub fn root_pointer_key(name: &str) -> String {
    format!("{}.html", name)
}

/// Listing prefix covering a version's whole tree, e.g. `12/`
///
/// The trailing slash makes this an exact path-segment match: version 12
/// must never report existing because version 120 does.
pub fn version_prefix(version: Version) -> String {
    format!("{}/", version)
}

/// Listing prefix for a version's source-oriented mirror, e.g. `12/src/`
pub fn src_prefix(version: Version) -> String {
    format!("{}/src/", version)
}

/// Auxiliary key inside a version tree, e.g. `12/robots.txt`
pub fn aux_key(version: Version, name: &str) -> String {
    format!("{}/{}", version, name)
}

/// Root-relative key for a versioned one, e.g. `12/src/main.js` → `src/main.js`
pub fn strip_version_prefix(key: &str, version: Version) -> Option<String> {
    key.strip_prefix(&version_prefix(version)).map(String::from)
}

/// Parse a version out of an `index.<digits>.html` key name.
pub fn parse_index_key(key: &str) -> Option<Version> {
    let digits = key.strip_prefix("index.")?.strip_suffix(".html")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Destination key for a staged artifact.
///
/// Path segments named after the staging directory become the version
/// identifier; when that leaves the path unchanged, the leading `src`
/// segment is nested under the version instead, producing the
/// `<version>/src/...` mirror.
pub fn artifact_key(relative_path: &str, version: Version) -> String {
    let version_segment = version.to_string();
    let segments: Vec<&str> = relative_path.split('/').collect();

    if segments.contains(&STAGING_DIR) {
        return segments
            .iter()
            .map(|s| if *s == STAGING_DIR { version_segment.as_str() } else { *s })
            .collect::<Vec<_>>()
            .join("/");
    }

    let mut rewritten: Vec<String> = segments.iter().map(|s| s.to_string()).collect();
    if let Some(pos) = segments.iter().position(|s| *s == "src") {
        rewritten[pos] = format!("{}/src", version_segment);
    }
    rewritten.join("/")
}
