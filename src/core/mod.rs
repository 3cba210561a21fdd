//! Core data structures for pyxbuild.
//!
//! - Build capability (whether Cython is available)
//! - Extension descriptors
//! - The project manifest
//! - Version information

pub mod capability;
pub mod extension;
pub mod manifest;
pub mod version;

pub use capability::{BuildCapability, CythonCompiler, SourceSuffix};
pub use extension::{ExtensionDescriptor, ExtensionSet};
pub use manifest::{find_manifest, Manifest, ManifestError, MANIFEST_NAME};
pub use version::VersionInfo;
