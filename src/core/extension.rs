//! Native extension descriptors.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::core::capability::{BuildCapability, SourceSuffix};
use crate::core::manifest::{ExtensionSpec, Manifest};

/// One native extension module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionDescriptor {
    name: String,
    sources: Vec<PathBuf>,
    include_dirs: BTreeSet<PathBuf>,
}

impl ExtensionDescriptor {
    /// Build a descriptor for `spec` using the given source suffix.
    pub fn from_spec(package_dir: &str, spec: &ExtensionSpec, suffix: SourceSuffix) -> Self {
        ExtensionDescriptor {
            name: spec.name.clone(),
            sources: vec![source_path(package_dir, &spec.subdir, &spec.source, suffix)],
            include_dirs: spec.include_dirs.iter().cloned().collect(),
        }
    }

    /// Dotted module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source files, relative to the project root.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn include_dirs(&self) -> &BTreeSet<PathBuf> {
        &self.include_dirs
    }

    /// The pre-generated form of every source.
    pub fn generated_sources(&self) -> Vec<PathBuf> {
        self.sources
            .iter()
            .map(|src| src.with_extension(SourceSuffix::PregeneratedForm.extension()))
            .collect()
    }

    /// Module path of the built library, e.g. `pandas/_tseries`.
    pub fn module_path(&self) -> PathBuf {
        self.name.split('.').collect()
    }
}

/// `{package_dir}/{subdir}/{stem}{suffix}`
pub fn source_path(package_dir: &str, subdir: &str, stem: &str, suffix: SourceSuffix) -> PathBuf {
    Path::new(package_dir)
        .join(subdir)
        .join(format!("{}{}", stem, suffix))
}

/// Every extension of the project, built for one capability.
///
/// Taking the capability by reference means the set cannot be built
/// before toolchain detection has produced one.
#[derive(Debug, Clone)]
pub struct ExtensionSet {
    suffix: SourceSuffix,
    extensions: Vec<ExtensionDescriptor>,
}

impl ExtensionSet {
    pub fn new(manifest: &Manifest, capability: &BuildCapability) -> Self {
        let suffix = capability.source_suffix();
        let extensions = manifest
            .extensions
            .iter()
            .map(|spec| ExtensionDescriptor::from_spec(manifest.package_dir(), spec, suffix))
            .collect();

        ExtensionSet { suffix, extensions }
    }

    pub fn suffix(&self) -> SourceSuffix {
        self.suffix
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtensionDescriptor> {
        self.extensions.iter()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Pre-generated source paths across all extensions.
    pub fn generated_sources(&self) -> Vec<PathBuf> {
        self.extensions
            .iter()
            .flat_map(|ext| ext.generated_sources())
            .collect()
    }
}
