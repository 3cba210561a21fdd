//! Cython toolchain detection.
//!
//! Detection never fails: an absent compiler is a supported configuration
//! that selects pre-generated sources and the sanity-checked build.

use std::path::Path;

use crate::core::capability::{BuildCapability, CythonCompiler};
use crate::core::manifest::ToolchainSettings;
use crate::util::process::{find_executable, find_first_executable};

/// Executable names probed on `PATH`, in order.
pub const CYTHON_CANDIDATES: &[&str] = &["cython", "cython3"];

/// How detection should treat the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Detection {
    /// Probe the manifest override, then `PATH`.
    #[default]
    Probe,
    /// Behave as if the compiler were absent.
    Disabled,
}

/// Detect the Cython compiler.
pub fn detect_capability(settings: &ToolchainSettings, detection: Detection) -> BuildCapability {
    if detection == Detection::Disabled {
        tracing::debug!("cython detection disabled");
        return BuildCapability::without_compiler();
    }

    let found = match settings.cython.as_deref() {
        Some(configured) => probe_configured(configured),
        None => find_first_executable(CYTHON_CANDIDATES),
    };

    match found {
        Some(path) => {
            tracing::debug!("using cython at {}", path.display());
            BuildCapability::with_compiler(CythonCompiler::new(path))
        }
        None => {
            tracing::debug!("cython not found; using pre-generated C sources");
            BuildCapability::without_compiler()
        }
    }
}

fn probe_configured(path: &Path) -> Option<std::path::PathBuf> {
    let found = find_executable(path);
    if found.is_none() {
        tracing::warn!("configured cython not found: {}", path.display());
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_disabled_detection() {
        let settings = ToolchainSettings {
            cython: Some(PathBuf::from("/bin/sh")),
            cc: None,
        };
        let cap = detect_capability(&settings, Detection::Disabled);
        assert!(!cap.compiler_available());
    }

    #[test]
    fn test_missing_configured_compiler_is_absent() {
        let settings = ToolchainSettings {
            cython: Some(PathBuf::from("/nonexistent/bin/cython")),
            cc: None,
        };
        let cap = detect_capability(&settings, Detection::Probe);
        assert!(!cap.compiler_available());
    }

    #[cfg(unix)]
    #[test]
    fn test_configured_compiler_is_used() {
        let settings = ToolchainSettings {
            cython: Some(PathBuf::from("/bin/sh")),
            cc: None,
        };
        let cap = detect_capability(&settings, Detection::Probe);
        assert!(cap.compiler_available());
        assert!(cap.compiler().unwrap().path().ends_with("sh"));
    }
}
