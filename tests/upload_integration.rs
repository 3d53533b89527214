//! Integration tests for uploading a staged artifact tree

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use geodeploy::{transform, Activation, Lifecycle, MemoryStore, Registry};

fn write(root: &Path, relative: &str, content: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Lay out a staged build the way the statification step leaves it.
fn stage_build(version: u32) -> TempDir {
    let staged = TempDir::new().unwrap();
    let root = staged.path();

    let index = format!("<html><script>version: '{}'</script></html>", version);
    write(root, "prd/index.html", index.as_bytes());
    write(root, "prd/embed.html", index.as_bytes());
    write(root, "prd/mobile.html", index.as_bytes());

    write(root, "prd/lib/build.js", b"var app = {};");
    write(root, "prd/style/app.css", b"body { margin: 0; }");
    write(root, "prd/style/theme.less", b"@color: red;");
    write(root, "prd/img/logo.png", b"\x89PNG rawbytes");
    write(root, "prd/locales/de.json", b"{\"title\": \"Karte\"}");

    write(root, "prd/cache/services", b"{\"services\": []}");
    write(root, "prd/cache/layersConfig.de.json", b"{\"layers\": {}}");
    write(root, "prd/cache/layersConfig.fr.json", b"{\"layers\": {}}");
    write(
        root,
        &format!("prd/geoadmin.{}.appcache", version),
        b"CACHE MANIFEST",
    );
    write(root, "prd/robots.txt", b"User-agent: *");
    write(root, "prd/checker", b"OK");

    write(root, "src/index.html", index.as_bytes());
    write(root, "src/components/map.js", b"export var map = 1;");
    write(root, "src/.gitignore", b"node_modules");

    staged
}

fn languages() -> Vec<String> {
    vec!["de".to_string(), "fr".to_string()]
}

#[test]
fn test_upload_lays_out_the_version_tree() {
    let staged = stage_build(12);
    let store = MemoryStore::new();

    let report = Lifecycle::new(&store)
        .upload(12, staged.path(), &languages())
        .unwrap();
    assert_eq!(report.failed(), 0);

    for key in [
        // bulk tree, staging dir rewritten to the version
        "12/index.html",
        "12/lib/build.js",
        "12/style/app.css",
        "12/img/logo.png",
        "12/locales/de.json",
        // source mirror, nested under the version
        "12/src/index.html",
        "12/src/components/map.js",
        // pointer documents
        "index.12.html",
        "embed.12.html",
        "mobile.12.html",
        // aux documents and their src/ mirror
        "12/services",
        "12/layersConfig.de.json",
        "12/layersConfig.fr.json",
        "12/geoadmin.appcache",
        "12/robots.txt",
        "12/checker",
        "12/src/services",
        "12/src/layersConfig.de.json",
        "12/src/layersConfig.fr.json",
    ] {
        assert!(store.contains(key), "missing key: {}", key);
    }
}

#[test]
fn test_upload_skips_excluded_files() {
    let staged = stage_build(12);
    let store = MemoryStore::new();

    Lifecycle::new(&store)
        .upload(12, staged.path(), &languages())
        .unwrap();

    let keys = store.keys();
    assert!(keys.iter().all(|k| !k.ends_with(".less")));
    assert!(keys.iter().all(|k| !k.contains(".gitignore")));
}

#[test]
fn test_upload_applies_transform_policies() {
    let staged = stage_build(12);
    let store = MemoryStore::new();

    Lifecycle::new(&store)
        .upload(12, staged.path(), &languages())
        .unwrap();

    // Versioned text artifact: gzipped, cached forever.
    let css = store.meta("12/style/app.css").unwrap();
    assert_eq!(css.content_type, "text/css");
    assert_eq!(css.content_encoding.as_deref(), Some("gzip"));
    assert_eq!(css.cache_control, transform::CACHE_FOREVER);
    assert_eq!(css.expires, None);
    assert_eq!(
        transform::gunzip(&store.body("12/style/app.css").unwrap()).unwrap(),
        b"body { margin: 0; }"
    );

    // Raster image: stored verbatim.
    let png = store.meta("12/img/logo.png").unwrap();
    assert_eq!(png.content_encoding, None);
    assert_eq!(store.body("12/img/logo.png").unwrap(), b"\x89PNG rawbytes");

    // Pointer document: revalidated on every request, pre-expired.
    let pointer = store.meta("index.12.html").unwrap();
    assert_eq!(pointer.cache_control, transform::NO_CACHE);
    assert_eq!(pointer.expires, Some(transform::stale_expiry()));

    // Cache manifest: explicit content type, never cached.
    let appcache = store.meta("12/geoadmin.appcache").unwrap();
    assert_eq!(appcache.content_type, "text/cache-manifest");
    assert_eq!(appcache.cache_control, transform::NO_CACHE);
}

#[test]
fn test_upload_makes_the_version_known_but_not_active() {
    let staged = stage_build(12);
    let store = MemoryStore::new();

    let registry = Registry::new(&store);
    assert!(!registry.version_exists(12).unwrap());

    Lifecycle::new(&store)
        .upload(12, staged.path(), &languages())
        .unwrap();

    assert!(registry.version_exists(12).unwrap());
    assert_eq!(registry.active_version().unwrap(), 0);
}

#[test]
fn test_upload_is_best_effort_per_object() {
    let staged = stage_build(12);
    fs::remove_file(staged.path().join("prd/robots.txt")).unwrap();
    let store = MemoryStore::new();

    let report = Lifecycle::new(&store)
        .upload(12, staged.path(), &languages())
        .unwrap();

    // The missing aux file is reported, everything else still uploads.
    assert_eq!(report.failed(), 1);
    let failed: Vec<&str> = report.failures().map(|o| o.key.as_str()).collect();
    assert_eq!(failed, vec!["12/robots.txt"]);
    assert!(store.contains("12/checker"));
    assert!(store.contains("index.12.html"));
}

#[test]
fn test_rerunning_upload_repairs_a_partial_version() {
    let staged = stage_build(12);
    fs::remove_file(staged.path().join("prd/robots.txt")).unwrap();
    let store = MemoryStore::new();

    let lifecycle = Lifecycle::new(&store);
    let first = lifecycle.upload(12, staged.path(), &languages()).unwrap();
    assert_eq!(first.failed(), 1);

    write(staged.path(), "prd/robots.txt", b"User-agent: *");
    let second = lifecycle.upload(12, staged.path(), &languages()).unwrap();
    assert_eq!(second.failed(), 0);
    assert!(store.contains("12/robots.txt"));
}

#[test]
fn test_uploaded_version_activates_end_to_end() {
    let staged = stage_build(12);
    let store = MemoryStore::new();

    let lifecycle = Lifecycle::new(&store);
    lifecycle.upload(12, staged.path(), &languages()).unwrap();

    let outcome = lifecycle.activate(12).unwrap();
    assert!(matches!(outcome, Activation::Switched { .. }));

    let registry = Registry::new(&store);
    assert_eq!(registry.active_version().unwrap(), 12);
    assert!(store.contains("src/index.html"));
    assert!(store.contains("robots.txt"));
    assert_eq!(
        store.body("index.html").unwrap(),
        store.body("index.12.html").unwrap()
    );
}
