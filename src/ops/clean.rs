//! `pyxbuild clean`: remove generated build artifacts.
//!
//! Cleaning is best-effort. Each removal produces its own result, failures
//! are counted and logged, and nothing is propagated to the caller, so
//! running clean twice in a row is always safe.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use walkdir::WalkDir;

use crate::core::manifest::Manifest;
use crate::ops::driver::Driver;
use crate::util::shell::Status;

/// File extensions of generated artifacts.
pub const ARTIFACT_EXTENSIONS: &[&str] = &["pyc", "so", "o", "pyd", "c"];

/// Bytecode cache directory name.
pub const BYTECODE_CACHE_DIR: &str = "__pycache__";

/// Files and trees queued for removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanPlan {
    pub files: Vec<PathBuf>,
    pub trees: Vec<PathBuf>,
}

/// Outcome of removing one queued path.
#[derive(Debug)]
pub struct CleanItem {
    pub path: PathBuf,
    pub result: io::Result<()>,
}

/// Aggregate of a clean run.
#[derive(Debug, Default)]
pub struct CleanSummary {
    pub removed: usize,
    pub skipped: usize,
    pub items: Vec<CleanItem>,
}

impl CleanSummary {
    fn record(&mut self, path: PathBuf, result: io::Result<()>) {
        match &result {
            Ok(()) => self.removed += 1,
            Err(e) => {
                tracing::debug!("skipped {}: {}", path.display(), e);
                self.skipped += 1;
            }
        }
        self.items.push(CleanItem { path, result });
    }
}

impl CleanPlan {
    /// Scan `package_root` for artifacts and queue `build_dir` if present.
    ///
    /// `all` is accepted for command-line compatibility; every scan is a
    /// full scan.
    pub fn scan(package_root: &Path, build_dir: &Path, all: bool) -> Self {
        if !all {
            tracing::debug!("--all=false requested; performing a full clean anyway");
        }

        let mut plan = CleanPlan::default();

        let mut walker = WalkDir::new(package_root).into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() && entry.file_name() == BYTECODE_CACHE_DIR {
                plan.trees.push(entry.into_path());
                walker.skip_current_dir();
            } else if file_type.is_file() && is_artifact(entry.path()) {
                plan.files.push(entry.into_path());
            }
        }

        if build_dir.exists() {
            plan.trees.push(build_dir.to_path_buf());
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.trees.is_empty()
    }

    /// Remove every queued path, recording each result.
    pub fn execute(self) -> CleanSummary {
        let mut summary = CleanSummary::default();

        for file in self.files {
            let result = fs::remove_file(&file);
            summary.record(file, result);
        }
        for tree in self.trees {
            let result = fs::remove_dir_all(&tree);
            summary.record(tree, result);
        }

        summary
    }
}

fn is_artifact(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ARTIFACT_EXTENSIONS.contains(&ext))
}

/// Clean the project rooted at `root`.
pub fn clean(root: &Path, manifest: &Manifest, all: bool) -> CleanSummary {
    let package_root = root.join(manifest.package_dir());
    let build_dir = root.join(&manifest.build.dir);
    CleanPlan::scan(&package_root, &build_dir, all).execute()
}

/// Command entry point.
pub fn run(driver: &Driver) -> Result<()> {
    let summary = clean(driver.root(), driver.manifest(), driver.options().clean_all);

    for item in summary.items.iter().filter(|i| i.result.is_ok()) {
        driver.shell().verbose_status(Status::Removed, item.path.display());
    }
    driver.shell().status(
        Status::Finished,
        format!(
            "clean: {} removed, {} skipped",
            summary.removed, summary.skipped
        ),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    fn tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("pkg/a.o"));
        touch(&root.join("pkg/b.so"));
        touch(&root.join("pkg/__pycache__/x"));
        touch(&root.join("pkg/core/frame.py"));
        touch(&root.join("pkg/src/tseries.pyx"));
        touch(&root.join("pkg/src/tseries.c"));
        touch(&root.join("build/lib/pkg/_tseries.so"));
        tmp
    }

    #[test]
    fn test_scan_collects_artifacts() {
        let tmp = tree();
        let root = tmp.path();

        let plan = CleanPlan::scan(&root.join("pkg"), &root.join("build"), true);

        let mut files = plan.files.clone();
        files.sort();
        assert_eq!(
            files,
            vec![
                root.join("pkg/a.o"),
                root.join("pkg/b.so"),
                root.join("pkg/src/tseries.c"),
            ]
        );
        assert!(plan.trees.contains(&root.join("pkg/__pycache__")));
        assert!(plan.trees.contains(&root.join("build")));
    }

    #[test]
    fn test_clean_removes_everything_queued() {
        let tmp = tree();
        let root = tmp.path();

        let summary = CleanPlan::scan(&root.join("pkg"), &root.join("build"), true).execute();

        assert_eq!(summary.removed, 5);
        assert_eq!(summary.skipped, 0);
        assert!(!root.join("pkg/a.o").exists());
        assert!(!root.join("pkg/b.so").exists());
        assert!(!root.join("pkg/__pycache__").exists());
        assert!(!root.join("build").exists());
        assert!(root.join("pkg/core/frame.py").exists());
        assert!(root.join("pkg/src/tseries.pyx").exists());
    }

    #[test]
    fn test_failed_removal_is_skipped() {
        let tmp = tree();
        let root = tmp.path();

        let plan = CleanPlan::scan(&root.join("pkg"), &root.join("build"), true);
        // Gone before execution: that one removal fails, the rest proceed.
        fs::remove_file(root.join("pkg/a.o")).unwrap();
        let summary = plan.execute();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.removed, 4);
        let failed: Vec<_> = summary
            .items
            .iter()
            .filter(|i| i.result.is_err())
            .map(|i| i.path.clone())
            .collect();
        assert_eq!(failed, vec![root.join("pkg/a.o")]);
        assert!(!root.join("build").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_artifact_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tree();
        let root = tmp.path();
        let locked = root.join("pkg/locked");
        touch(&locked.join("c.o"));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        // Permission bits do not apply to root.
        if fs::write(locked.join(".write-check"), "").is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let summary = CleanPlan::scan(&root.join("pkg"), &root.join("build"), true).execute();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.removed, 5);
        let failed = summary.items.iter().find(|i| i.result.is_err()).unwrap();
        assert_eq!(failed.path, locked.join("c.o"));
        assert_eq!(
            failed.result.as_ref().unwrap_err().kind(),
            io::ErrorKind::PermissionDenied
        );
        assert!(locked.join("c.o").exists());
        assert!(!root.join("pkg/a.o").exists());
        assert!(!root.join("pkg/b.so").exists());
        assert!(!root.join("build").exists());
    }

    #[test]
    fn test_clean_twice_is_noop() {
        let tmp = tree();
        let root = tmp.path();

        CleanPlan::scan(&root.join("pkg"), &root.join("build"), true).execute();
        let second = CleanPlan::scan(&root.join("pkg"), &root.join("build"), true);
        assert!(second.is_empty());

        let summary = second.execute();
        assert_eq!(summary.removed, 0);
        assert_eq!(summary.skipped, 0);
    }

    #[test]
    fn test_missing_package_root_is_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let plan = CleanPlan::scan(&tmp.path().join("nope"), &tmp.path().join("build"), false);
        assert!(plan.is_empty());
    }
}
