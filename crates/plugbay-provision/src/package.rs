// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Variant manifest parsing from the `package.toml` at an archive's root.
//!
//! The variant manifest lists, per platform, the binaries a package ships.
//! Every problem found here is reported as [`PlugbayError::ArchiveCorrupt`]
//! since the file comes from the downloaded archive.

use std::path::{Component, Path};

use plugbay_core::{PackageIdentity, Platform, PlugbayError, VariantGroup};
use serde::Deserialize;

/// File name of the variant manifest inside every package.
pub const PACKAGE_MANIFEST: &str = "package.toml";

/// Parsed `package.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    pub id: String,
    pub version: String,
    pub description: Option<String>,
    /// Variant groups in declaration order.
    pub variants: Vec<VariantGroup>,
}

/// Intermediate TOML deserialization struct for `package.toml`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PackageManifestFile {
    package: PackageSection,
    #[serde(default)]
    variants: Vec<VariantSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PackageSection {
    id: String,
    version: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VariantSection {
    platform: String,
    #[serde(default)]
    items: Vec<String>,
}

/// Parses a variant manifest. `package` names the archive in error messages.
pub fn parse_package_manifest(
    package: &str,
    toml_content: &str,
) -> Result<PackageManifest, PlugbayError> {
    let file: PackageManifestFile = toml::from_str(toml_content)
        .map_err(|e| corrupt(package, format!("invalid {PACKAGE_MANIFEST}: {e}")))?;

    let section = file.package;
    if section.id.trim().is_empty() {
        return Err(corrupt(package, "package id must not be empty".to_string()));
    }
    if file.variants.is_empty() {
        return Err(corrupt(
            package,
            "at least one [[variants]] entry is required".to_string(),
        ));
    }

    let mut variants = Vec::with_capacity(file.variants.len());
    for variant in file.variants {
        variant.platform.parse::<Platform>().map_err(|e| {
            corrupt(package, format!("variant platform '{}': {e}", variant.platform))
        })?;
        for item in &variant.items {
            check_item_path(package, item)?;
        }
        variants.push(VariantGroup {
            platform: variant.platform,
            items: variant.items,
        });
    }

    Ok(PackageManifest {
        id: section.id,
        version: section.version,
        description: section.description,
        variants,
    })
}

/// Reads and parses `package.toml` from an extracted package directory.
pub async fn read_package_manifest(
    package_dir: &Path,
    identity: &PackageIdentity,
) -> Result<PackageManifest, PlugbayError> {
    let path = package_dir.join(PACKAGE_MANIFEST);
    let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
        PlugbayError::ArchiveCorrupt {
            package: identity.to_string(),
            message: format!("cannot read {}: {e}", path.display()),
            root: None,
            source: Some(Box::new(e)),
        }
    })?;
    parse_package_manifest(&identity.to_string(), &content)
}

/// Item paths are joined onto the package directory and must stay inside it.
fn check_item_path(package: &str, item: &str) -> Result<(), PlugbayError> {
    if item.trim().is_empty() {
        return Err(corrupt(package, "variant item path must not be empty".to_string()));
    }
    let escapes = Path::new(item).components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes || item.starts_with('/') || item.starts_with('\\') {
        return Err(corrupt(
            package,
            format!("variant item '{item}' must be a relative path inside the package"),
        ));
    }
    Ok(())
}

fn corrupt(package: &str, message: String) -> PlugbayError {
    PlugbayError::ArchiveCorrupt {
        package: package.to_string(),
        message,
        root: None,
        source: None,
    }
}
