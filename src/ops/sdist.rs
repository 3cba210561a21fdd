//! `pyxbuild sdist`: source distribution with a generated-source guard.
//!
//! A source distribution must build on machines without Cython, so it has
//! to ship every generated `.c` file. With Cython available the files are
//! regenerated first; without it, each one must already exist or the
//! command fails before writing anything.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

use crate::core::capability::SourceSuffix;
use crate::core::extension::ExtensionSet;
use crate::core::manifest::{package_path, MANIFEST_NAME};
use crate::ops::command::SdistMode;
use crate::ops::driver::Driver;
use crate::util::fs::{ensure_dir, files_with_extension, glob_files, relative_path};
use crate::util::shell::Status;

/// Errors that stop a source distribution.
#[derive(Debug, Error)]
pub enum SdistError {
    #[error("C-source file {} not found", quote_paths(.paths))]
    MissingGeneratedSource { paths: Vec<PathBuf> },
}

fn quote_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("'{}'", p.display()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Command entry point.
pub fn sdist(driver: &Driver, mode: SdistMode) -> Result<()> {
    ensure_generated_sources(driver, mode)?;

    let archive = make_archive(driver)?;
    driver
        .shell()
        .status(Status::Packaged, archive.display());
    Ok(())
}

/// Make sure every generated source exists before archiving.
pub fn ensure_generated_sources(driver: &Driver, mode: SdistMode) -> Result<()> {
    match mode {
        SdistMode::CompilerDriven => driver.run_command("cython"),
        SdistMode::PregenRequired => {
            verify_pregenerated(driver.root(), driver.extensions())?;
            Ok(())
        }
    }
}

/// Fail if any pre-generated source of `extensions` is missing under `root`.
pub fn verify_pregenerated(root: &Path, extensions: &ExtensionSet) -> Result<(), SdistError> {
    let missing: Vec<PathBuf> = extensions
        .generated_sources()
        .into_iter()
        .filter(|path| !root.join(path).is_file())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SdistError::MissingGeneratedSource { paths: missing })
    }
}

/// Project-relative files that go into the source distribution, sorted.
pub fn collect_files(driver: &Driver) -> Result<BTreeSet<PathBuf>> {
    let root = driver.root();
    let manifest = driver.manifest();
    let mut files = BTreeSet::new();

    if root.join(MANIFEST_NAME).is_file() {
        files.insert(PathBuf::from(MANIFEST_NAME));
    }

    let version_file = manifest.version_file();
    if root.join(&version_file).is_file() {
        files.insert(version_file);
    }

    for package in manifest.packages() {
        for module in files_with_extension(&root.join(package_path(&package)), "py")? {
            files.insert(relative_path(root, &module));
        }
    }

    for (package, patterns) in &manifest.package.package_data {
        for file in glob_files(&root.join(package_path(package)), patterns)? {
            files.insert(relative_path(root, &file));
        }
    }

    for ext in driver.extensions().iter() {
        for src in ext.sources() {
            for suffix in [SourceSuffix::IntermediateForm, SourceSuffix::PregeneratedForm] {
                let candidate = src.with_extension(suffix.extension());
                if root.join(&candidate).is_file() {
                    files.insert(candidate);
                }
            }
        }
    }

    for file in glob_files(root, &manifest.package.extra_files)? {
        files.insert(relative_path(root, &file));
    }

    Ok(files)
}

/// Base name of the archive and its top-level directory.
pub fn archive_base_name(driver: &Driver) -> String {
    format!("{}-{}", driver.manifest().package.name, driver.version())
}

/// Write `{dist_dir}/{name}-{version}.tar.gz`.
pub fn make_archive(driver: &Driver) -> Result<PathBuf> {
    let files = collect_files(driver)?;
    let base = archive_base_name(driver);

    let dist_dir = driver.dist_dir();
    ensure_dir(&dist_dir)?;
    let archive_path = dist_dir.join(format!("{}.tar.gz", base));

    let file = File::create(&archive_path)
        .with_context(|| format!("failed to create archive: {}", archive_path.display()))?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    builder.mode(tar::HeaderMode::Deterministic);

    let prefix = Path::new(&base);
    for rel in &files {
        builder
            .append_path_with_name(driver.root().join(rel), prefix.join(rel))
            .with_context(|| format!("failed to add {} to archive", rel.display()))?;
        driver
            .shell()
            .verbose_status(Status::Copying, rel.display());
    }

    builder
        .into_inner()
        .and_then(|encoder| encoder.finish())
        .with_context(|| format!("failed to finish archive: {}", archive_path.display()))?;

    tracing::debug!(
        "wrote {} file(s) to {}",
        files.len(),
        archive_path.display()
    );
    Ok(archive_path)
}
