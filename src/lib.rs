//! # geodeploy — versioned releases of the map viewer in an S3 bucket
//!
//! Each release of the statified map viewer lives immutably in the bucket
//! under its numeric version prefix; which version is "live" is decided by
//! three root pointer documents that activation overwrites with copies of
//! the version's own pointer documents. There is no deployment server:
//! uploading, switching and deleting versions are all plain object-store
//! operations.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use geodeploy::{DeployConfig, Lifecycle, Registry, S3Store};
//!
//! # fn main() -> geodeploy::Result<()> {
//! let config = DeployConfig::load(None)?;
//! let store = S3Store::connect(&config)?;
//!
//! // What is deployed, and what is live?
//! let registry = Registry::new(&store);
//! for entry in registry.list_versions()? {
//!     println!("{} {}", entry.version, entry.last_modified);
//! }
//! let active = registry.active_version()?;
//!
//! // Switch the live version.
//! let lifecycle = Lifecycle::new(&store);
//! lifecycle.activate(1524)?;
//! # Ok(())
//! # }
//! ```
//!
//! Activation is a sequence of idempotent object copies, not a
//! transaction: a reader hitting the site mid-switch may see a mix of old
//! and new documents. Re-running a failed activation completes it.

pub mod config;
pub mod content_type;
pub mod error;
pub mod layout;
pub mod lifecycle;
pub mod manifest;
pub mod marker;
pub mod registry;
pub mod store;
pub mod transform;

pub use config::DeployConfig;
pub use error::{ReleaseError, Result};
pub use lifecycle::{Activation, Lifecycle, UploadOutcome, UploadReport};
pub use registry::{Registry, Version, VersionEntry, NO_ACTIVE_VERSION};
pub use store::{Acl, ListedObject, MemoryStore, ObjectMeta, ObjectStore, S3Store};
