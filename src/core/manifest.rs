//! `Pyxbuild.toml` manifest parsing and schema.
//!
//! The manifest declares package metadata, the release numbers used for
//! version stamping, the native extension modules, and optional toolchain
//! overrides.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::core::version::VersionInfo;

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "Pyxbuild.toml";

/// Errors locating or validating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not find `{}` in `{}` or any parent directory", MANIFEST_NAME, .dir.display())]
    NotFound { dir: PathBuf },

    #[error("invalid manifest: {0}")]
    Invalid(String),
}

/// Parsed project manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub package: PackageMetadata,

    pub version: VersionSpec,

    #[serde(default, rename = "extension")]
    pub extensions: Vec<ExtensionSpec>,

    #[serde(default)]
    pub toolchain: ToolchainSettings,

    #[serde(default)]
    pub build: BuildSettings,
}

/// `[package]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageMetadata {
    pub name: String,

    /// Top-level package directory, relative to the project root.
    /// Defaults to the package name.
    #[serde(default)]
    pub package_dir: Option<String>,

    /// Dotted package names whose modules are built and distributed.
    #[serde(default)]
    pub packages: Vec<String>,

    /// Extra data files per package, as glob patterns relative to the package.
    #[serde(default)]
    pub package_data: BTreeMap<String, Vec<String>>,

    /// Files outside the packages that ship in source distributions.
    #[serde(default)]
    pub extra_files: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub maintainer: Option<String>,
    #[serde(default)]
    pub maintainer_email: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// `[version]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionSpec {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
    #[serde(default)]
    pub released: bool,
    /// Version artifact path. Defaults to `{package_dir}/version.py`.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// One `[[extension]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtensionSpec {
    /// Dotted module name, e.g. `pandas._tseries`.
    pub name: String,
    /// Source file stem, without suffix.
    pub source: String,
    #[serde(default = "default_subdir")]
    pub subdir: String,
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
}

fn default_subdir() -> String {
    "src".to_string()
}

/// `[toolchain]` section: explicit tool locations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolchainSettings {
    #[serde(default)]
    pub cython: Option<PathBuf>,
    #[serde(default)]
    pub cc: Option<PathBuf>,
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSettings {
    #[serde(default = "default_build_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_dist_dir")]
    pub dist_dir: PathBuf,
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("build")
}

fn default_dist_dir() -> PathBuf {
    PathBuf::from("dist")
}

impl Default for BuildSettings {
    fn default() -> Self {
        BuildSettings {
            dir: default_build_dir(),
            dist_dir: default_dist_dir(),
        }
    }
}

impl Manifest {
    /// Load and validate a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))
    }

    /// Parse and validate manifest text.
    pub fn parse(contents: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(contents)?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<(), ManifestError> {
        if self.package.name.trim().is_empty() {
            return Err(ManifestError::Invalid("package name is empty".into()));
        }

        let mut seen = HashSet::new();
        for ext in &self.extensions {
            if ext.name.is_empty() || ext.source.is_empty() {
                return Err(ManifestError::Invalid(
                    "extension entries need both `name` and `source`".into(),
                ));
            }
            if !seen.insert(ext.name.as_str()) {
                return Err(ManifestError::Invalid(format!(
                    "extension `{}` is declared more than once",
                    ext.name
                )));
            }
        }

        Ok(())
    }

    /// Top-level package directory, relative to the project root.
    pub fn package_dir(&self) -> &str {
        self.package
            .package_dir
            .as_deref()
            .unwrap_or(&self.package.name)
    }

    /// Declared packages, falling back to the top-level package alone.
    pub fn packages(&self) -> Vec<String> {
        if self.package.packages.is_empty() {
            vec![self.package_dir().replace('/', ".")]
        } else {
            self.package.packages.clone()
        }
    }

    /// Version artifact path, relative to the project root.
    pub fn version_file(&self) -> PathBuf {
        self.version
            .file
            .clone()
            .unwrap_or_else(|| Path::new(self.package_dir()).join("version.py"))
    }

    /// Release numbers without a revision.
    pub fn version_info(&self) -> VersionInfo {
        VersionInfo::new(
            self.version.major,
            self.version.minor,
            self.version.micro,
            self.version.released,
        )
    }
}

/// Directory of a dotted package name, relative to the project root.
pub fn package_path(package: &str) -> PathBuf {
    package.split('.').collect()
}

/// Find the manifest in `dir` or any of its parents.
pub fn find_manifest(dir: &Path) -> Result<PathBuf, ManifestError> {
    let mut current = dir.to_path_buf();
    loop {
        let candidate = current.join(MANIFEST_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(ManifestError::NotFound {
                dir: dir.to_path_buf(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PANDAS: &str = r#"
[package]
name = "pandas"
packages = ["pandas", "pandas.core", "pandas.io"]

[package.package_data]
"pandas.io" = ["tests/*.csv"]

[version]
major = 0
minor = 4
micro = 1

[[extension]]
name = "pandas._tseries"
source = "tseries"

[[extension]]
name = "pandas._sparse"
source = "sparse"
include_dirs = ["include"]
"#;

    #[test]
    fn test_parse_with_defaults() {
        let m = Manifest::parse(PANDAS).unwrap();

        assert_eq!(m.package_dir(), "pandas");
        assert_eq!(m.extensions.len(), 2);
        assert_eq!(m.extensions[0].subdir, "src");
        assert_eq!(m.extensions[1].include_dirs, vec![PathBuf::from("include")]);
        assert!(!m.version.released);
        assert_eq!(m.version_file(), PathBuf::from("pandas/version.py"));
        assert_eq!(m.build.dir, PathBuf::from("build"));
        assert_eq!(m.build.dist_dir, PathBuf::from("dist"));
        assert!(m.toolchain.cython.is_none());
    }

    #[test]
    fn test_packages_default_to_package_dir() {
        let m = Manifest::parse(
            "[package]\nname = \"demo\"\n[version]\nmajor = 1\nminor = 0\nmicro = 0\n",
        )
        .unwrap();
        assert_eq!(m.packages(), vec!["demo".to_string()]);
    }

    #[test]
    fn test_duplicate_extension_rejected() {
        let text = format!(
            "{}\n[[extension]]\nname = \"pandas._sparse\"\nsource = \"other\"\n",
            PANDAS
        );
        let err = Manifest::parse(&text).unwrap_err();
        assert!(format!("{:#}", err).contains("declared more than once"));
    }

    #[test]
    fn test_package_path() {
        assert_eq!(package_path("pandas.io"), PathBuf::from("pandas").join("io"));
    }

    #[test]
    fn test_find_manifest_searches_upward() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(MANIFEST_NAME), PANDAS).unwrap();
        let nested = tmp.path().join("pandas/src");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_manifest(&nested).unwrap();
        assert_eq!(found, tmp.path().join(MANIFEST_NAME));
    }

    #[test]
    fn test_find_manifest_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = find_manifest(tmp.path()).unwrap_err();
        assert!(matches!(err, ManifestError::NotFound { .. }));
    }
}
