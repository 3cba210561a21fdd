//! The build driver.
//!
//! One driver exists per invocation. It detects the toolchain, builds the
//! extension set and command registry from the result, stamps the version
//! artifact, and runs commands by name.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::toolchain::{detect_capability, Detection};
use crate::core::capability::BuildCapability;
use crate::core::extension::ExtensionSet;
use crate::core::manifest::Manifest;
use crate::core::version::VersionInfo;
use crate::ops::command::{Command, CommandRegistry};
use crate::util::shell::{Shell, Status};

/// Per-invocation options from the command line.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub detection: Detection,
    /// `clean --all`; always a full clean.
    pub clean_all: bool,
    /// Override of `build.dist_dir`.
    pub dist_dir: Option<PathBuf>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        DriverOptions {
            detection: Detection::Probe,
            clean_all: true,
            dist_dir: None,
        }
    }
}

pub struct Driver {
    root: PathBuf,
    manifest: Manifest,
    capability: BuildCapability,
    extensions: ExtensionSet,
    registry: CommandRegistry,
    version: OnceCell<VersionInfo>,
    shell: Shell,
    options: DriverOptions,
}

impl Driver {
    /// Detect the toolchain and set up the driver for `root`.
    pub fn new(root: impl Into<PathBuf>, manifest: Manifest, shell: Shell, options: DriverOptions) -> Self {
        let capability = detect_capability(&manifest.toolchain, options.detection);
        Driver::with_capability(root, manifest, capability, shell, options)
    }

    /// Set up the driver with an already-detected capability.
    pub fn with_capability(
        root: impl Into<PathBuf>,
        manifest: Manifest,
        capability: BuildCapability,
        shell: Shell,
        options: DriverOptions,
    ) -> Self {
        let extensions = ExtensionSet::new(&manifest, &capability);
        let registry = CommandRegistry::for_capability(&capability);

        tracing::debug!(
            "cython available: {}, extension sources use {}",
            capability.compiler_available(),
            extensions.suffix()
        );

        Driver {
            root: root.into(),
            manifest,
            capability,
            extensions,
            registry,
            version: OnceCell::new(),
            shell,
            options,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn capability(&self) -> &BuildCapability {
        &self.capability
    }

    pub fn extensions(&self) -> &ExtensionSet {
        &self.extensions
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    /// Build output directory.
    pub fn build_dir(&self) -> PathBuf {
        self.root.join(&self.manifest.build.dir)
    }

    /// Directory receiving built modules.
    pub fn build_lib_dir(&self) -> PathBuf {
        self.build_dir().join("lib")
    }

    /// Directory receiving source distributions.
    pub fn dist_dir(&self) -> PathBuf {
        let dir = self
            .options
            .dist_dir
            .as_ref()
            .unwrap_or(&self.manifest.build.dist_dir);
        self.root.join(dir)
    }

    /// Version for this invocation, looking up the revision on first use.
    pub fn version(&self) -> &VersionInfo {
        self.version
            .get_or_init(|| self.manifest.version_info().resolve_revision(&self.root))
    }

    /// Write the version artifact.
    pub fn stamp_version(&self) -> Result<&VersionInfo> {
        let version = self.version();
        let path = self.root.join(self.manifest.version_file());
        version.write_version_file(&path)?;
        self.shell
            .verbose_status(Status::Stamped, format!("{} -> {}", version, path.display()));
        Ok(version)
    }

    /// Run the named commands in order.
    ///
    /// Every name is resolved before anything runs, and the version artifact
    /// is written before the first command that depends on it.
    pub fn run(&self, names: &[String]) -> Result<()> {
        let commands = names
            .iter()
            .map(|name| self.registry.resolve(name).map(|cmd| (name.as_str(), *cmd)))
            .collect::<Result<Vec<(&str, Command)>, _>>()?;

        if commands.iter().any(|(_, cmd)| cmd.needs_version_stamp()) {
            self.stamp_version()?;
        }

        for (name, command) in commands {
            tracing::debug!("running command `{}`", name);
            command.execute(self)?;
        }
        Ok(())
    }

    /// Run one command by name, as a step of another command.
    pub fn run_command(&self, name: &str) -> Result<()> {
        let command = *self.registry.resolve(name)?;
        tracing::debug!("running sub-command `{}`", name);
        command.execute(self)
    }
}
