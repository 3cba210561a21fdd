//! High-level operations.
//!
//! This module contains the command registry, the driver, and the
//! implementation of each command.

pub mod build;
pub mod clean;
pub mod command;
pub mod driver;
pub mod sdist;

pub use clean::{CleanPlan, CleanSummary};
pub use command::{BuildExtMode, Command, CommandError, CommandRegistry, SdistMode};
pub use driver::{Driver, DriverOptions};
pub use sdist::SdistError;
