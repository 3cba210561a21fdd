//! pyxbuild - build orchestration for packages with Cython extensions
//!
//! This crate detects whether the Cython compiler is available, selects the
//! extension source form and command set accordingly, stamps the package
//! version, and runs the clean, build, and sdist commands.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

pub use crate::core::{BuildCapability, ExtensionSet, Manifest, SourceSuffix, VersionInfo};
pub use ops::{Command, CommandRegistry, Driver, DriverOptions};
pub use util::context::GlobalContext;
