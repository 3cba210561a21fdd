//! Subprocess execution utilities.
//!
//! External tools (git, cython, the C compiler) are run synchronously with
//! no timeout; a hung tool blocks the build.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{bail, Context, Result};

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    /// Execute the command and capture its output.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        cmd.output()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))
    }

    /// Execute and require success.
    pub fn exec_and_check(&self) -> Result<Output> {
        let output = self.exec()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "`{}` failed with exit code {:?}\n{}",
                self.display_command(),
                output.status.code(),
                stderr
            );
        }
        Ok(output)
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Find an executable by name or path.
pub fn find_executable(name: impl AsRef<OsStr>) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find the first of `candidates` that resolves to an executable.
pub fn find_first_executable(candidates: &[&str]) -> Option<PathBuf> {
    candidates.iter().find_map(|name| find_executable(name))
}

/// Find a C compiler, preferring an explicit path.
pub fn find_c_compiler(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        let found = find_executable(path);
        if found.is_none() {
            tracing::warn!("configured C compiler not found: {}", path.display());
        }
        return found;
    }
    find_first_executable(&["cc", "gcc", "clang"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_process_builder() {
        let output = ProcessBuilder::new("echo").arg("hello").exec().unwrap();

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert_eq!(stdout.trim(), "hello");
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("cython").args(["pkg/src/a.pyx", "-o", "pkg/src/a.c"]);

        assert_eq!(pb.display_command(), "cython pkg/src/a.pyx -o pkg/src/a.c");
    }

    #[test]
    fn test_missing_program_fails_to_spawn() {
        let err = ProcessBuilder::new("definitely-not-a-real-tool-xyz")
            .exec()
            .unwrap_err();
        assert!(format!("{:#}", err).contains("failed to spawn"));
    }
}
