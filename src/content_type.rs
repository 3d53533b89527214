//! Content-type lookup by file extension
//!
//! Thin table covering the artifact types the build produces. The font
//! types mirror what the deployed objects already declare, so re-uploads
//! keep matching the incompressible set in the transform.

use std::path::Path;

/// Fallback for unknown extensions
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Guess a content type from the file extension.
pub fn guess(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("txt") => "text/plain",
        Some("appcache") => "text/cache-manifest",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/ico",
        Some("ttf") => "application/x-font-ttf",
        Some("otf") => "application/x-font-opentype",
        Some("eot") => "application/vnd.ms-fontobject",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
