//! Version stamping.
//!
//! The full version is composed from the release numbers in the manifest,
//! a `.dev` marker for unreleased builds, and the short revision of the
//! checkout when one can be looked up. It is written to a small artifact
//! that the package reads at import time.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::util::fs::ensure_dir;
use crate::util::process::ProcessBuilder;

/// Release numbers plus the optional revision of the working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
    pub released: bool,
    pub revision: Option<String>,
}

impl VersionInfo {
    pub fn new(major: u32, minor: u32, micro: u32, released: bool) -> Self {
        VersionInfo {
            major,
            minor,
            micro,
            released,
            revision: None,
        }
    }

    /// Attach a revision identifier. Empty identifiers are ignored.
    pub fn with_revision(mut self, revision: Option<String>) -> Self {
        self.revision = revision.filter(|r| !r.is_empty());
        self
    }

    /// Look up the checkout revision for unreleased versions.
    ///
    /// Released versions never carry a revision, so no lookup happens.
    pub fn resolve_revision(self, root: &Path) -> Self {
        if self.released {
            return self;
        }
        let revision = lookup_revision(root);
        self.with_revision(revision)
    }

    /// `{major}.{minor}.{micro}`
    pub fn version(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.micro)
    }

    /// The version with `.dev` and revision suffixes applied.
    pub fn full_version(&self) -> String {
        let mut full = self.version();
        if !self.released {
            full.push_str(".dev");
        }
        if let Some(ref rev) = self.revision {
            full.push('-');
            full.push_str(rev);
        }
        full
    }

    /// Contents of the version artifact.
    pub fn artifact_contents(&self) -> String {
        format!("version = '{}'\n", self.full_version())
    }

    /// Overwrite the version artifact at `path`.
    ///
    /// The file handle is scoped to this call and closed on every exit path.
    pub fn write_version_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }

        let mut file = File::create(path)
            .with_context(|| format!("failed to create version file: {}", path.display()))?;
        file.write_all(self.artifact_contents().as_bytes())
            .with_context(|| format!("failed to write version file: {}", path.display()))?;

        tracing::debug!("wrote {} to {}", self.full_version(), path.display());
        Ok(())
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_version())
    }
}

/// Ask git for the short revision of `HEAD` in `root`.
///
/// Every failure mode (git missing, not a repository, empty output) is
/// reported as a warning and yields `None`.
pub fn lookup_revision(root: &Path) -> Option<String> {
    let result = ProcessBuilder::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .cwd(root)
        .exec_and_check();

    match result {
        Ok(output) => {
            let rev = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if rev.is_empty() {
                tracing::warn!("couldn't get git revision: empty output");
                None
            } else {
                Some(rev)
            }
        }
        Err(e) => {
            tracing::warn!("couldn't get git revision");
            tracing::debug!("revision lookup failed: {:#}", e);
            None
        }
    }
}
