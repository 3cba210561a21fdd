//! Build commands: `metadata`, `build_py`, `build_ext`, and `cython`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::builder::cython::Cythonizer;
use crate::builder::native::NativeBuilder;
use crate::core::capability::CythonCompiler;
use crate::core::extension::{ExtensionDescriptor, ExtensionSet};
use crate::core::manifest::package_path;
use crate::ops::command::BuildExtMode;
use crate::ops::driver::Driver;
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::fs::{copy_file, files_with_extension, glob_files, relative_path};
use crate::util::shell::{Shell, Status};

/// `metadata`: print the package's name, version, and descriptive fields.
pub fn metadata(driver: &Driver) -> Result<()> {
    let pkg = &driver.manifest().package;
    let shell = driver.shell();

    shell.print(format!("name: {}", pkg.name));
    shell.print(format!("version: {}", driver.version()));

    let optional = [
        ("description", &pkg.description),
        ("license", &pkg.license),
        ("maintainer", &pkg.maintainer),
        ("maintainer_email", &pkg.maintainer_email),
        ("url", &pkg.url),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            shell.print(format!("{}: {}", key, value));
        }
    }

    shell.print(format!(
        "extension_sources: {}",
        driver.extensions().suffix()
    ));
    Ok(())
}

/// `build_py`: copy interpreted modules and package data into `build/lib`.
pub fn build_py(driver: &Driver) -> Result<()> {
    let root = driver.root();
    let lib_dir = driver.build_lib_dir();
    let mut copied = 0;

    for package in driver.manifest().packages() {
        let pkg_dir = package_path(&package);
        for module in files_with_extension(&root.join(&pkg_dir), "py")? {
            let rel = relative_path(root, &module);
            copy_file(&module, &lib_dir.join(&rel))?;
            driver.shell().verbose_status(Status::Copying, rel.display());
            copied += 1;
        }
    }

    for (package, patterns) in &driver.manifest().package.package_data {
        let pkg_dir = root.join(package_path(package));
        for file in glob_files(&pkg_dir, patterns)? {
            let rel = relative_path(root, &file);
            copy_file(&file, &lib_dir.join(&rel))?;
            driver.shell().verbose_status(Status::Copying, rel.display());
            copied += 1;
        }
    }

    tracing::debug!("build_py copied {} file(s)", copied);
    Ok(())
}

/// `build_ext`: compile every extension, preparing sources per `mode`.
pub fn build_ext(driver: &Driver, mode: BuildExtMode) -> Result<()> {
    let extensions = driver.extensions();
    if extensions.is_empty() {
        return Ok(());
    }

    if mode == BuildExtMode::SanityChecked {
        check_pregenerated_sources(driver.root(), extensions, driver.shell());
    }

    let native = NativeBuilder::detect(
        driver.manifest().toolchain.cc.as_deref(),
        driver.root(),
        &driver.build_lib_dir(),
    )?;

    for ext in extensions.iter() {
        let sources = match mode {
            BuildExtMode::CompilerDriven => {
                let compiler = require_compiler(driver)?;
                translate(driver, compiler, ext)?;
                ext.generated_sources()
            }
            BuildExtMode::Generic | BuildExtMode::SanityChecked => ext.sources().to_vec(),
        };

        driver.shell().status(Status::Compiling, ext.name());
        let output = native.compile(ext, &sources)?;
        driver
            .shell()
            .verbose_status(Status::Finished, output.display());
    }

    Ok(())
}

/// `cython`: translate every `.pyx` source and stop before native compilation.
pub fn cython(driver: &Driver) -> Result<()> {
    let compiler = require_compiler(driver)?;

    for ext in driver.extensions().iter() {
        translate(driver, compiler, ext)?;
        driver.shell().verbose_status(
            Status::Skipped,
            format!("native compilation of {}", ext.name()),
        );
    }
    Ok(())
}

/// Warn about each declared source that does not exist.
///
/// The build continues afterwards so the C compiler can report its own,
/// more specific error. Returns the missing paths.
pub fn check_pregenerated_sources(root: &Path, extensions: &ExtensionSet, shell: &Shell) -> Vec<PathBuf> {
    let mut missing = Vec::new();

    for ext in extensions.iter() {
        for src in ext.sources() {
            if root.join(src).exists() {
                continue;
            }
            let diag = Diagnostic::warning(format!(
                "Cython-generated file '{}' not found",
                src.display()
            ))
            .with_location(src.clone())
            .with_context(format!(
                "Cython is required to build `{}` from a development checkout",
                ext.name()
            ))
            .with_suggestion(suggestions::INSTALL_CYTHON);
            shell.diagnostic(&diag);
            missing.push(src.clone());
        }
    }

    missing
}

fn require_compiler(driver: &Driver) -> Result<&CythonCompiler> {
    match driver.capability().compiler() {
        Some(compiler) => Ok(compiler),
        None => bail!("cython is not available"),
    }
}

fn translate(driver: &Driver, compiler: &CythonCompiler, ext: &ExtensionDescriptor) -> Result<()> {
    driver.shell().status(Status::Cythonizing, ext.name());
    let generated = Cythonizer::new(compiler, driver.root()).translate(ext)?;
    for path in generated {
        tracing::debug!("generated {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::capability::BuildCapability;
    use crate::core::manifest::Manifest;
    use crate::ops::driver::DriverOptions;
    use crate::util::shell::{ColorChoice, Verbosity};
    use std::fs;
    use tempfile::TempDir;

    fn manifest() -> Manifest {
        Manifest::parse(
            r#"
[package]
name = "pkg"
packages = ["pkg", "pkg.core"]

[package.package_data]
"pkg" = ["tests/*.csv"]

[version]
major = 1
minor = 0
micro = 0

[[extension]]
name = "pkg._a"
source = "a"

[[extension]]
name = "pkg._b"
source = "b"
"#,
        )
        .unwrap()
    }

    fn quiet() -> Shell {
        Shell::new(Verbosity::Quiet, ColorChoice::Never)
    }

    #[test]
    fn test_sanity_check_reports_missing_sources() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("pkg/src")).unwrap();
        fs::write(tmp.path().join("pkg/src/a.c"), "").unwrap();

        let set = ExtensionSet::new(&manifest(), &BuildCapability::without_compiler());
        let missing = check_pregenerated_sources(tmp.path(), &set, &quiet());

        assert_eq!(missing, vec![PathBuf::from("pkg/src/b.c")]);
    }

    #[test]
    fn test_build_py_copies_modules_and_data() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("pkg/core")).unwrap();
        fs::create_dir_all(root.join("pkg/tests")).unwrap();
        fs::write(root.join("pkg/__init__.py"), "").unwrap();
        fs::write(root.join("pkg/core/frame.py"), "").unwrap();
        fs::write(root.join("pkg/tests/data.csv"), "1,2\n").unwrap();
        fs::write(root.join("pkg/tests/test_frame.py"), "").unwrap();

        let driver = Driver::with_capability(
            root,
            manifest(),
            BuildCapability::without_compiler(),
            quiet(),
            DriverOptions::default(),
        );
        build_py(&driver).unwrap();

        let lib = root.join("build/lib");
        assert!(lib.join("pkg/__init__.py").exists());
        assert!(lib.join("pkg/core/frame.py").exists());
        assert!(lib.join("pkg/tests/data.csv").exists());
        assert!(!lib.join("pkg/tests/test_frame.py").exists());
    }

    #[test]
    fn test_cython_requires_compiler() {
        let tmp = TempDir::new().unwrap();
        let driver = Driver::with_capability(
            tmp.path(),
            manifest(),
            BuildCapability::without_compiler(),
            quiet(),
            DriverOptions::default(),
        );
        assert!(cython(&driver).is_err());
    }

    #[test]
    fn test_compiler_driven_compiles_generated_form() {
        let set = ExtensionSet::new(
            &manifest(),
            &BuildCapability::with_compiler(CythonCompiler::new("cython")),
        );
        let ext = set.iter().next().unwrap();
        assert_eq!(ext.sources(), &[PathBuf::from("pkg/src/a.pyx")]);
        assert_eq!(ext.generated_sources(), vec![PathBuf::from("pkg/src/a.c")]);
    }
}
