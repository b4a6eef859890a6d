// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plugbay install` and `plugbay uninstall` command implementations.

use std::path::Path;

use colored::Colorize;
use plugbay::{
    InstallReport, PackageDescriptor, PackageIdentity, PlugbayConfig, PlugbayError, Provisioner,
    registry_from_config, validate_package_id,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Parses a `--package` argument: `id`, `id@version`, or `id@latest`.
pub fn parse_package_arg(arg: &str, prerelease: bool) -> Result<PackageDescriptor, PlugbayError> {
    let descriptor = match arg.split_once('@') {
        Some((id, "latest")) => PackageDescriptor::latest(id),
        Some((id, version)) => PackageDescriptor::exact(id, version),
        None => PackageDescriptor::latest(arg),
    }
    .with_prerelease(prerelease);
    descriptor.validate()?;
    Ok(descriptor)
}

/// Run `plugbay install`.
///
/// Provisions the configured packages plus any given on the command line and
/// lists the binaries selected for this platform. Binding capabilities needs
/// the host application's registration table, so none are bound here.
pub async fn run_install(
    config: &PlugbayConfig,
    root: &Path,
    extra: Vec<PackageDescriptor>,
    cancel: CancellationToken,
) -> Result<(), PlugbayError> {
    let mut descriptors = config.packages.clone();
    for descriptor in extra {
        if !descriptors.contains(&descriptor) {
            descriptors.push(descriptor);
        }
    }

    let client = registry_from_config(config)?;
    let provisioner = Provisioner::from_config(config, client)?.with_cancellation(cancel);
    info!(root = %root.display(), packages = descriptors.len(), "starting install");

    let report = provisioner.install(root, &descriptors).await?;
    print!("{}", render_report(&report));
    Ok(())
}

fn render_report(report: &InstallReport) -> String {
    let mut out = String::new();
    for package in &report.packages {
        let state = if package.reused {
            "reused".dimmed()
        } else {
            "installed".green()
        };
        out.push_str(&format!(
            "{} {} [{}] ({})\n",
            "✓".green(),
            package.identity.to_string().bold(),
            package.platform,
            state
        ));
        for file in &package.files {
            out.push_str(&format!("    {}\n", file.display()));
        }
    }
    for unresolved in &report.unresolved {
        out.push_str(&format!(
            "{} {}: {}\n",
            "!".yellow(),
            unresolved.descriptor.to_string().bold(),
            unresolved.reason.yellow()
        ));
    }

    out.push_str(&format!("\n{report}\n"));
    out.push_str(&format!(
        "{} binaries ready for composition\n",
        report.files().len()
    ));
    out
}

/// Run `plugbay uninstall <id> <version>`.
pub async fn run_uninstall(
    config: &PlugbayConfig,
    root: &Path,
    id: &str,
    version: &str,
) -> Result<(), PlugbayError> {
    validate_package_id(id)?;
    let version = semver::Version::parse(version)
        .map_err(|e| PlugbayError::Config(format!("invalid version '{version}': {e}")))?;
    let identity = PackageIdentity::new(id, version);

    let client = registry_from_config(config)?;
    let provisioner = Provisioner::from_config(config, client)?;
    if provisioner.uninstall(root, &identity).await? {
        println!("{} removed {}", "✓".green(), identity.to_string().bold());
    } else {
        println!("{} {} was not installed", "-".dimmed(), identity);
    }
    Ok(())
}
