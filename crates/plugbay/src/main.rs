// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugbay - plugin package provisioning.
//!
//! This is the binary entry point for the `plugbay` command.

mod install;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use plugbay::{PlugbayConfig, PlugbayError};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Plugbay - provision plugin packages and compose their capabilities.
#[derive(Parser, Debug)]
#[command(name = "plugbay", version, about, long_about = None)]
struct Cli {
    /// Configuration file to load instead of the standard hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Provision the configured packages and build the capability registry.
    Install {
        /// Installation root (defaults to `install.root`).
        #[arg(long)]
        root: Option<PathBuf>,
        /// Extra package to install, as `id`, `id@version`, or `id@latest`.
        #[arg(long = "package", short = 'p')]
        packages: Vec<String>,
        /// Allow prerelease versions for `--package` entries without a version.
        #[arg(long)]
        prerelease: bool,
    },
    /// Show requested and installed packages of an installation root.
    Status {
        #[arg(long)]
        root: Option<PathBuf>,
        /// Print the manifest as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Remove one installed package from an installation root.
    Uninstall {
        id: String,
        version: String,
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => plugbay::load_and_validate_path(path),
        None => plugbay::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            plugbay::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log.level);
    if cli.plain {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &PlugbayConfig) -> Result<(), PlugbayError> {
    let root_or_default = |root: Option<PathBuf>| root.unwrap_or_else(|| config.install.root_path());

    match command {
        Commands::Install {
            root,
            packages,
            prerelease,
        } => {
            let extra = packages
                .iter()
                .map(|p| install::parse_package_arg(p, prerelease))
                .collect::<Result<Vec<_>, _>>()?;

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupt received, cancelling after the current step");
                    on_signal.cancel();
                }
            });

            install::run_install(config, &root_or_default(root), extra, cancel).await
        }
        Commands::Status { root, json } => status::run_status(&root_or_default(root), json),
        Commands::Uninstall { id, version, root } => {
            install::run_uninstall(config, &root_or_default(root), &id, &version).await
        }
    }
}

/// Initialize the tracing subscriber with an environment filter.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("plugbay={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
