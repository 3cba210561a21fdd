//! Global context for pyxbuild operations.
//!
//! Resolves the working directory and the project manifest once per
//! invocation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::manifest::{find_manifest as find_manifest_upward, ManifestError};

/// Process-wide paths for one invocation.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    cwd: PathBuf,
    manifest_override: Option<PathBuf>,
}

impl GlobalContext {
    /// Context rooted at the current directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(GlobalContext::with_cwd(cwd))
    }

    /// Context rooted at a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            manifest_override: None,
        }
    }

    /// Use an explicit manifest path instead of searching.
    pub fn with_manifest_path(mut self, path: Option<PathBuf>) -> Self {
        self.manifest_override = path.map(|p| {
            if p.is_absolute() {
                p
            } else {
                self.cwd.join(p)
            }
        });
        self
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Locate the manifest: the explicit path if given, otherwise the
    /// nearest `Pyxbuild.toml` at or above the working directory.
    pub fn find_manifest(&self) -> Result<PathBuf, ManifestError> {
        match self.manifest_override {
            Some(ref path) if path.is_file() => Ok(path.clone()),
            Some(ref path) => Err(ManifestError::NotFound {
                dir: path.parent().unwrap_or(Path::new(".")).to_path_buf(),
            }),
            None => find_manifest_upward(&self.cwd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::MANIFEST_NAME;
    use tempfile::TempDir;

    #[test]
    fn test_relative_manifest_override() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("proj")).unwrap();
        std::fs::write(tmp.path().join("proj").join(MANIFEST_NAME), "").unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf())
            .with_manifest_path(Some(PathBuf::from("proj").join(MANIFEST_NAME)));

        assert_eq!(
            ctx.find_manifest().unwrap(),
            tmp.path().join("proj").join(MANIFEST_NAME)
        );
    }

    #[test]
    fn test_missing_override_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf())
            .with_manifest_path(Some(PathBuf::from("nope/Pyxbuild.toml")));

        assert!(matches!(
            ctx.find_manifest(),
            Err(ManifestError::NotFound { .. })
        ));
    }
}
