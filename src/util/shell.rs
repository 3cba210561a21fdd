//! User-facing status output.
//!
//! Status lines are written to stderr with a right-aligned, 12-column
//! status word, colored only when stderr is a terminal. Library code uses
//! `tracing` for diagnostics and this shell for progress the user asked for.

use std::fmt::Display;
use std::io::{self, IsTerminal};

use crate::util::diagnostic::Diagnostic;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: warnings and errors only
    Quiet,
    #[default]
    Normal,
    /// --verbose: per-item status lines
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

/// Status words for output lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success (green)
    Finished,
    Removed,
    Stamped,
    Packaged,

    // In progress (cyan)
    Compiling,
    Cythonizing,
    Copying,

    // Warning (yellow)
    Skipped,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Finished => "Finished",
            Status::Removed => "Removed",
            Status::Stamped => "Stamped",
            Status::Packaged => "Packaged",
            Status::Compiling => "Compiling",
            Status::Cythonizing => "Cythonizing",
            Status::Copying => "Copying",
            Status::Skipped => "Skipped",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Finished | Status::Removed | Status::Stamped | Status::Packaged => "\x1b[1;32m",
            Status::Compiling | Status::Cythonizing | Status::Copying => "\x1b[1;36m",
            Status::Skipped => "\x1b[1;33m",
        }
    }

    fn is_warning(&self) -> bool {
        matches!(self, Status::Skipped)
    }
}

/// Central shell for CLI output.
#[derive(Debug, Clone)]
pub struct Shell {
    verbosity: Verbosity,
    use_color: bool,
}

impl Shell {
    pub fn new(verbosity: Verbosity, color: ColorChoice) -> Self {
        let use_color = match color {
            ColorChoice::Auto => io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };
        Shell {
            verbosity,
            use_color,
        }
    }

    /// Shell from CLI flags. Quiet wins over verbose.
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };
        Shell::new(verbosity, ColorChoice::Auto)
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status line. Warnings are printed even in quiet mode.
    pub fn status(&self, status: Status, message: impl Display) {
        if self.verbosity == Verbosity::Quiet && !status.is_warning() {
            return;
        }
        eprintln!("{}", self.format_status(status, &message));
    }

    /// Print a status line only in verbose mode.
    pub fn verbose_status(&self, status: Status, message: impl Display) {
        if self.verbosity == Verbosity::Verbose {
            self.status(status, message);
        }
    }

    /// Print a rendered diagnostic.
    pub fn diagnostic(&self, diagnostic: &Diagnostic) {
        eprint!("{}", diagnostic.format(self.use_color));
    }

    /// Plain line on stdout, for command output meant to be consumed.
    pub fn print(&self, message: impl Display) {
        println!("{}", message);
    }

    fn format_status(&self, status: Status, message: &dyn Display) -> String {
        if self.use_color {
            format!("{}{:>12}\x1b[0m {}", status.color_code(), status.as_str(), message)
        } else {
            format!("{:>12} {}", status.as_str(), message)
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(Verbosity::Normal, ColorChoice::Auto)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_alignment() {
        let shell = Shell::new(Verbosity::Normal, ColorChoice::Never);
        let line = shell.format_status(Status::Removed, &"build");
        assert_eq!(line, "     Removed build");
    }

    #[test]
    fn test_quiet_beats_verbose() {
        let shell = Shell::from_flags(true, true);
        assert_eq!(shell.verbosity(), Verbosity::Quiet);
    }
}
