//! Command kinds and the name-to-command registry.
//!
//! Commands are plain data. The registry is filled with a base set and then
//! layered with the commands that depend on whether Cython is available.
//! A later registration under the same name replaces the earlier one.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;
use thiserror::Error;

use crate::core::capability::BuildCapability;
use crate::ops::driver::Driver;
use crate::ops::{build, clean, sdist};

/// How `build_ext` treats extension sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildExtMode {
    /// Compile the declared sources as they are.
    Generic,
    /// Translate `.pyx` to `.c`, then compile.
    CompilerDriven,
    /// Warn about missing pre-generated sources, then compile.
    SanityChecked,
}

/// How `sdist` makes sure generated sources are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdistMode {
    /// Regenerate every `.c` file with the compiler before archiving.
    CompilerDriven,
    /// Require every `.c` file to exist already.
    PregenRequired,
}

/// A command the driver can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Metadata,
    Clean,
    Build,
    BuildPy,
    BuildExt(BuildExtMode),
    /// Placeholder that keeps source generation out of the compiler-driven build.
    BuildSrc,
    /// Translate intermediate sources and stop before native compilation.
    Cython,
    Sdist(SdistMode),
}

impl Command {
    /// Run this command against the driver's context.
    pub fn execute(&self, driver: &Driver) -> Result<()> {
        match *self {
            Command::Metadata => build::metadata(driver),
            Command::Clean => clean::run(driver),
            Command::Build => {
                driver.run_command("build_py")?;
                driver.run_command("build_ext")
            }
            Command::BuildPy => build::build_py(driver),
            Command::BuildExt(mode) => build::build_ext(driver, mode),
            Command::BuildSrc => Ok(()),
            Command::Cython => build::cython(driver),
            Command::Sdist(mode) => sdist::sdist(driver, mode),
        }
    }

    /// Whether the version artifact must be current before this command runs.
    pub fn needs_version_stamp(&self) -> bool {
        !matches!(self, Command::Clean)
    }

    /// One-line description for command listings.
    pub fn description(&self) -> &'static str {
        match self {
            Command::Metadata => "print package metadata",
            Command::Clean => "remove generated build artifacts",
            Command::Build => "build interpreted modules and native extensions",
            Command::BuildPy => "copy interpreted modules into the build tree",
            Command::BuildExt(BuildExtMode::Generic) => "compile native extensions",
            Command::BuildExt(BuildExtMode::CompilerDriven) => {
                "translate .pyx sources, then compile native extensions"
            }
            Command::BuildExt(BuildExtMode::SanityChecked) => {
                "check pre-generated sources, then compile native extensions"
            }
            Command::BuildSrc => "no-op",
            Command::Cython => "translate .pyx sources to .c without compiling",
            Command::Sdist(_) => "create a source distribution",
        }
    }
}

/// Errors surfaced by command lookup.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid command '{name}' (available: {})", available.join(", "))]
    UnknownCommand { name: String, available: Vec<String> },
}

/// Mapping from command name to command.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Command>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        CommandRegistry {
            commands: BTreeMap::new(),
        }
    }

    /// Commands present regardless of the toolchain.
    pub fn base() -> Self {
        let mut registry = CommandRegistry::new();
        registry.register("metadata", Command::Metadata);
        registry.register("clean", Command::Clean);
        registry.register("build", Command::Build);
        registry.register("build_py", Command::BuildPy);
        registry.register("build_ext", Command::BuildExt(BuildExtMode::Generic));
        registry.register("sdist", Command::Sdist(SdistMode::PregenRequired));
        registry
    }

    /// The base set layered with the commands for `capability`.
    pub fn for_capability(capability: &BuildCapability) -> Self {
        let mut registry = CommandRegistry::base();

        if capability.compiler_available() {
            registry.register("build_src", Command::BuildSrc);
            registry.register("cython", Command::Cython);
            registry.register("build_ext", Command::BuildExt(BuildExtMode::CompilerDriven));
            registry.register("sdist", Command::Sdist(SdistMode::CompilerDriven));
        } else {
            registry.register("build_ext", Command::BuildExt(BuildExtMode::SanityChecked));
        }

        registry
    }

    /// Register `command` under `name`, returning the command it replaced.
    pub fn register(&mut self, name: impl Into<String>, command: Command) -> Option<Command> {
        self.commands.insert(name.into(), command)
    }

    /// Look up a command by name.
    pub fn resolve(&self, name: &str) -> Result<&Command, CommandError> {
        self.commands
            .get(name)
            .ok_or_else(|| CommandError::UnknownCommand {
                name: name.to_string(),
                available: self.names().map(str::to_string).collect(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Command)> {
        self.commands.iter().map(|(name, cmd)| (name.as_str(), cmd))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Display for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, cmd) in self.iter() {
            writeln!(f, "  {:<12} {}", name, cmd.description())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::capability::CythonCompiler;

    #[test]
    fn test_resolve_unknown_command() {
        let registry = CommandRegistry::base();
        let err = registry.resolve("bdist_wheel").unwrap_err();

        let CommandError::UnknownCommand { name, available } = &err;
        assert_eq!(name, "bdist_wheel");
        assert!(available.contains(&"clean".to_string()));
        assert!(err.to_string().contains("invalid command 'bdist_wheel'"));
    }

    #[test]
    fn test_later_registration_wins() {
        let mut registry = CommandRegistry::new();
        assert_eq!(registry.register("build", Command::BuildPy), None);
        assert_eq!(
            registry.register("build", Command::Build),
            Some(Command::BuildPy)
        );
        assert_eq!(registry.resolve("build").unwrap(), &Command::Build);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_base_commands_always_present() {
        for cap in [
            BuildCapability::without_compiler(),
            BuildCapability::with_compiler(CythonCompiler::new("cython")),
        ] {
            let registry = CommandRegistry::for_capability(&cap);
            assert_eq!(registry.resolve("metadata").unwrap(), &Command::Metadata);
            assert_eq!(registry.resolve("clean").unwrap(), &Command::Clean);
            assert_eq!(registry.resolve("build").unwrap(), &Command::Build);
        }
    }

    #[test]
    fn test_compiler_present_overrides() {
        let cap = BuildCapability::with_compiler(CythonCompiler::new("cython"));
        let registry = CommandRegistry::for_capability(&cap);

        assert_eq!(registry.resolve("cython").unwrap(), &Command::Cython);
        assert_eq!(registry.resolve("build_src").unwrap(), &Command::BuildSrc);
        assert_eq!(
            registry.resolve("build_ext").unwrap(),
            &Command::BuildExt(BuildExtMode::CompilerDriven)
        );
        assert_eq!(
            registry.resolve("sdist").unwrap(),
            &Command::Sdist(SdistMode::CompilerDriven)
        );
    }

    #[test]
    fn test_compiler_absent_overrides() {
        let registry = CommandRegistry::for_capability(&BuildCapability::without_compiler());

        assert!(!registry.contains("cython"));
        assert!(!registry.contains("build_src"));
        assert_eq!(
            registry.resolve("build_ext").unwrap(),
            &Command::BuildExt(BuildExtMode::SanityChecked)
        );
        assert_eq!(
            registry.resolve("sdist").unwrap(),
            &Command::Sdist(SdistMode::PregenRequired)
        );
    }

    #[test]
    fn test_clean_skips_version_stamp() {
        assert!(!Command::Clean.needs_version_stamp());
        assert!(Command::Sdist(SdistMode::PregenRequired).needs_version_stamp());
    }
}
