//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// pyxbuild - build orchestration for packages with Cython extensions
#[derive(Parser)]
#[command(name = "pyxbuild")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to Pyxbuild.toml (defaults to searching upward from the current directory)
    #[arg(long, value_name = "PATH")]
    pub manifest_path: Option<PathBuf>,

    /// Behave as if Cython were not installed
    #[arg(long)]
    pub no_cython: bool,

    /// Remove all build output when cleaning (`--all=false` is accepted)
    #[arg(
        short,
        long,
        value_name = "BOOL",
        default_value_t = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub all: bool,

    /// Directory for source distributions (overrides `build.dist_dir`)
    #[arg(long, value_name = "DIR")]
    pub dist_dir: Option<PathBuf>,

    /// List the commands available with the detected toolchain
    #[arg(long)]
    pub list_commands: bool,

    /// Commands to run, in order (e.g. clean, build, build_ext, cython, sdist)
    #[arg(value_name = "COMMAND", required_unless_present = "list_commands")]
    pub commands: Vec<String>,
}
