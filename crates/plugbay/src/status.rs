// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plugbay status` command implementation.
//!
//! Reads the manifest of an installation root and lists the requested and
//! installed packages. With `--json` the manifest is printed as-is.

use std::path::Path;

use colored::Colorize;
use plugbay::{Manifest, ManifestStore, PlugbayError};

/// Run the `plugbay status` command.
pub fn run_status(root: &Path, json: bool) -> Result<(), PlugbayError> {
    let manifest = ManifestStore::new(root).load()?;

    if json {
        let out = serde_json::to_string_pretty(&manifest)
            .map_err(|e| PlugbayError::Internal(format!("failed to serialize manifest: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    print!("{}", render(root, &manifest));
    Ok(())
}

fn render(root: &Path, manifest: &Manifest) -> String {
    let mut out = format!("{} {}\n", "root:".bold(), root.display());

    out.push_str(&format!(
        "{} ({})\n",
        "requested".bold(),
        manifest.requested_packages.len()
    ));
    for descriptor in &manifest.requested_packages {
        out.push_str(&format!("    {descriptor}\n"));
    }

    out.push_str(&format!(
        "{} ({})\n",
        "installed".bold(),
        manifest.installed_packages.len()
    ));
    for record in &manifest.installed_packages {
        let version = record.version.as_deref().unwrap_or("?");
        out.push_str(&format!("    {}@{version}\n", record.id));
    }
    out
}
