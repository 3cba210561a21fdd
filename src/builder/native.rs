//! Native compilation of extension modules.
//!
//! Each extension is compiled and linked into a shared library in one
//! compiler invocation: `cc -shared -fPIC -I<dir>... <sources> -o <out>`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::core::extension::ExtensionDescriptor;
use crate::util::fs::ensure_dir;
use crate::util::process::{find_c_compiler, ProcessBuilder};

/// Platform file extension of extension modules.
#[cfg(windows)]
pub const EXTENSION_MODULE_SUFFIX: &str = "pyd";
#[cfg(not(windows))]
pub const EXTENSION_MODULE_SUFFIX: &str = "so";

/// Compiles extension modules with a C compiler.
#[derive(Debug, Clone)]
pub struct NativeBuilder {
    cc: PathBuf,
    root: PathBuf,
    lib_dir: PathBuf,
}

impl NativeBuilder {
    /// Builder writing libraries under `lib_dir`.
    pub fn new(cc: impl Into<PathBuf>, root: impl Into<PathBuf>, lib_dir: impl Into<PathBuf>) -> Self {
        NativeBuilder {
            cc: cc.into(),
            root: root.into(),
            lib_dir: lib_dir.into(),
        }
    }

    /// Locate a C compiler and create a builder.
    pub fn detect(configured: Option<&Path>, root: &Path, lib_dir: &Path) -> Result<Self> {
        let Some(cc) = find_c_compiler(configured) else {
            bail!(
                "no C compiler found\n\
                 \n\
                 Native extensions need a C compiler (cc, gcc, or clang).\n\
                 Install one or set `toolchain.cc` in Pyxbuild.toml."
            );
        };
        Ok(NativeBuilder::new(cc, root, lib_dir))
    }

    /// Output library path for `ext`.
    pub fn output_path(&self, ext: &ExtensionDescriptor) -> PathBuf {
        self.lib_dir
            .join(ext.module_path())
            .with_extension(EXTENSION_MODULE_SUFFIX)
    }

    /// The compiler invocation for `ext` built from `sources`.
    pub fn command(&self, ext: &ExtensionDescriptor, sources: &[PathBuf]) -> ProcessBuilder {
        let mut pb = ProcessBuilder::new(&self.cc)
            .cwd(&self.root)
            .args(["-shared", "-fPIC"]);
        for dir in ext.include_dirs() {
            pb = pb.arg(format!("-I{}", dir.display()));
        }
        pb.args(sources).arg("-o").arg(self.output_path(ext))
    }

    /// Compile `ext` from `sources` (relative to the project root).
    pub fn compile(&self, ext: &ExtensionDescriptor, sources: &[PathBuf]) -> Result<PathBuf> {
        let output = self.output_path(ext);
        if let Some(parent) = output.parent() {
            ensure_dir(parent)?;
        }

        let pb = self.command(ext, sources);
        tracing::debug!("running `{}`", pb.display_command());
        pb.exec_and_check()?;

        Ok(output)
    }
}
