//! Build capability: whether the Cython compiler is available.
//!
//! A `BuildCapability` is produced once by toolchain detection and then
//! passed by reference to everything that branches on it. The source suffix
//! is derived from the compiler, so the two can never disagree.

use std::fmt;
use std::path::{Path, PathBuf};

/// Extension source form chosen for this invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceSuffix {
    /// `.pyx`, translated by the compiler before native compilation.
    IntermediateForm,
    /// `.c`, already translated and shipped in source distributions.
    PregeneratedForm,
}

impl SourceSuffix {
    /// The suffix including the leading dot.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceSuffix::IntermediateForm => ".pyx",
            SourceSuffix::PregeneratedForm => ".c",
        }
    }

    /// The bare file extension.
    pub fn extension(&self) -> &'static str {
        &self.as_str()[1..]
    }
}

impl fmt::Display for SourceSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A located Cython executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CythonCompiler {
    path: PathBuf,
}

impl CythonCompiler {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CythonCompiler { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// What this build invocation can do.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildCapability {
    compiler: Option<CythonCompiler>,
}

impl BuildCapability {
    /// Capability with the compiler present.
    pub fn with_compiler(compiler: CythonCompiler) -> Self {
        BuildCapability {
            compiler: Some(compiler),
        }
    }

    /// Capability without the compiler.
    pub fn without_compiler() -> Self {
        BuildCapability { compiler: None }
    }

    pub fn compiler_available(&self) -> bool {
        self.compiler.is_some()
    }

    pub fn compiler(&self) -> Option<&CythonCompiler> {
        self.compiler.as_ref()
    }

    pub fn source_suffix(&self) -> SourceSuffix {
        if self.compiler_available() {
            SourceSuffix::IntermediateForm
        } else {
            SourceSuffix::PregeneratedForm
        }
    }
}
