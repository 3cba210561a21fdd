//! pyxbuild CLI

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;
use pyxbuild::builder::Detection;
use pyxbuild::core::{Manifest, ManifestError};
use pyxbuild::ops::SdistError;
use pyxbuild::util::diagnostic::suggestions;
use pyxbuild::util::{Diagnostic, GlobalContext, Shell};
use pyxbuild::{Driver, DriverOptions};

fn main() {
    if let Err(e) = run() {
        eprint!("{}", error_diagnostic(&e));
        std::process::exit(1);
    }
}

/// Top-level error, with a hint for the failures an operator can fix.
fn error_diagnostic(err: &anyhow::Error) -> Diagnostic {
    let diag = Diagnostic::error(format!("{:#}", err));
    if err.chain().any(|cause| cause.is::<SdistError>()) {
        diag.with_suggestion(suggestions::RUN_CYTHON)
    } else if let Some(ManifestError::NotFound { .. }) = err.downcast_ref::<ManifestError>() {
        diag.with_suggestion(suggestions::NO_MANIFEST)
    } else {
        diag
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("pyxbuild=debug")
    } else {
        EnvFilter::new("pyxbuild=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let shell = Shell::from_flags(cli.quiet, cli.verbose);
    let ctx = GlobalContext::new()?.with_manifest_path(cli.manifest_path.clone());

    let manifest_path = ctx.find_manifest()?;
    let root = manifest_path
        .parent()
        .context("manifest path has no parent directory")?
        .to_path_buf();
    let manifest = Manifest::load(&manifest_path)?;

    let options = DriverOptions {
        detection: if cli.no_cython {
            Detection::Disabled
        } else {
            Detection::Probe
        },
        clean_all: cli.all,
        dist_dir: cli.dist_dir,
    };
    let driver = Driver::new(root, manifest, shell, options);

    if cli.list_commands {
        print!("{}", driver.registry());
        return Ok(());
    }

    driver.run(&cli.commands)
}
