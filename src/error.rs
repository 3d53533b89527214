//! Error types for release operations

use thiserror::Error;

use crate::registry::Version;

/// Release operation result type
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Release operation errors
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Referenced version has no objects in the bucket
    #[error("version {0} does not exist in the bucket")]
    VersionNotFound(Version),

    /// Object does not exist in the store
    #[error("object does not exist: {0}")]
    KeyNotFound(String),

    /// Operation refused because the version is currently active
    #[error("version {0} is the active version")]
    ActiveVersion(Version),

    /// Root index document is readable but carries no version marker
    #[error("no version marker found in {0}")]
    MarkerNotFound(String),

    /// Gzip compression failed for a single object
    #[error("gzip compression failed: {source}")]
    Compression { source: std::io::Error },

    /// Input is not validly gzip-framed
    #[error("gzip decompression failed: {source}")]
    Decompression { source: std::io::Error },

    /// Underlying store call failed (network, permission, quota)
    #[error("store error: {0}")]
    Store(String),

    /// Config file could not be parsed
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
