// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common value types shared by the provisioning pipeline, registry clients,
//! and the manifest store.

use std::fmt;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::PlugbayError;

/// A caller's declaration of one wanted package.
///
/// Equality is structural; descriptor sets are compared with exact set
/// equality to detect a changed request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageDescriptor {
    /// Package identifier as known to the registry.
    pub id: String,
    /// Exact version to install. `None` means "latest".
    #[serde(default)]
    pub version: Option<String>,
    /// Whether prerelease versions are eligible when resolving "latest".
    #[serde(default)]
    pub prerelease: bool,
}

impl PackageDescriptor {
    /// Descriptor for the latest stable version of `id`.
    pub fn latest(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: None,
            prerelease: false,
        }
    }

    /// Descriptor pinned to an exact version of `id`.
    pub fn exact(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: Some(version.into()),
            prerelease: false,
        }
    }

    /// Allow prerelease versions when resolving "latest".
    pub fn with_prerelease(mut self, prerelease: bool) -> Self {
        self.prerelease = prerelease;
        self
    }

    /// Parses the pinned version, if any.
    pub fn requested_version(&self) -> Result<Option<Version>, PlugbayError> {
        self.version
            .as_deref()
            .map(|v| {
                Version::parse(v.trim()).map_err(|e| {
                    PlugbayError::Config(format!(
                        "invalid version '{v}' for package '{}': {e}",
                        self.id
                    ))
                })
            })
            .transpose()
    }

    /// Checks that the id is usable as a directory name component and that
    /// the pinned version (if any) parses.
    pub fn validate(&self) -> Result<(), PlugbayError> {
        validate_package_id(&self.id)?;
        self.requested_version()?;
        Ok(())
    }
}

impl fmt::Display for PackageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}@{v}", self.id),
            None if self.prerelease => write!(f, "{}@latest (prerelease)", self.id),
            None => write!(f, "{}@latest", self.id),
        }
    }
}

/// Rejects ids that are empty or could escape the installation root.
pub fn validate_package_id(id: &str) -> Result<(), PlugbayError> {
    if id.trim().is_empty() {
        return Err(PlugbayError::Config(
            "package id must not be empty".to_string(),
        ));
    }
    if id == "." || id == ".." {
        return Err(PlugbayError::Config(format!(
            "package id '{id}' is not a valid name"
        )));
    }
    if id
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_whitespace() || c.is_control())
    {
        return Err(PlugbayError::Config(format!(
            "package id '{id}' contains invalid characters (path separators and whitespace are not allowed)"
        )));
    }
    Ok(())
}

/// A concrete, resolved package: id plus exact version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageIdentity {
    pub id: String,
    pub version: Version,
}

impl PackageIdentity {
    pub fn new(id: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }

    /// Directory name of this package inside an installation root.
    pub fn dir_name(&self) -> String {
        format!("{}.{}", self.id, self.version)
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

/// Version metadata returned by a registry client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMetadata {
    pub identity: PackageIdentity,
    /// Optional human-readable summary from the registry index.
    pub description: Option<String>,
}

impl VersionMetadata {
    pub fn new(identity: PackageIdentity) -> Self {
        Self {
            identity,
            description: None,
        }
    }
}

/// Snapshot of an installed package kept in the manifest for bookkeeping.
///
/// Binary paths are never derived from this record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl From<&PackageIdentity> for InstalledPackage {
    fn from(identity: &PackageIdentity) -> Self {
        Self {
            id: identity.id.clone(),
            version: Some(identity.version.to_string()),
        }
    }
}

/// One platform-specific bundle of binaries inside a package archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantGroup {
    /// Platform token the binaries were built for.
    pub platform: String,
    /// Relative item paths, in declaration order.
    pub items: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_equality_is_structural() {
        let a = PackageDescriptor::exact("acme.greeter", "1.0.0");
        let b = PackageDescriptor::exact("acme.greeter", "1.0.0");
        let c = PackageDescriptor::exact("acme.greeter", "1.0.0").with_prerelease(true);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn requested_version_parses_exact() {
        let d = PackageDescriptor::exact("x", "0.24.0");
        assert_eq!(
            d.requested_version().unwrap(),
            Some(Version::new(0, 24, 0))
        );
        assert_eq!(PackageDescriptor::latest("x").requested_version().unwrap(), None);
    }

    #[test]
    fn requested_version_rejects_garbage() {
        let d = PackageDescriptor::exact("x", "not-a-version");
        let err = d.requested_version().unwrap_err();
        assert!(matches!(err, PlugbayError::Config(_)));
        assert!(err.to_string().contains("not-a-version"));
    }

    #[test]
    fn validate_rejects_path_like_ids() {
        assert!(validate_package_id("acme.greeter").is_ok());
        assert!(validate_package_id("").is_err());
        assert!(validate_package_id("..").is_err());
        assert!(validate_package_id("../etc").is_err());
        assert!(validate_package_id("a b").is_err());
        assert!(validate_package_id("a\\b").is_err());
    }

    #[test]
    fn identity_dir_name_joins_id_and_version() {
        let id = PackageIdentity::new("acme.greeter", Version::parse("2.0.0-beta").unwrap());
        assert_eq!(id.dir_name(), "acme.greeter.2.0.0-beta");
        assert_eq!(id.to_string(), "acme.greeter@2.0.0-beta");
    }

    #[test]
    fn descriptor_serde_defaults() {
        let d: PackageDescriptor = serde_json::from_str(r#"{"id":"acme"}"#).unwrap();
        assert_eq!(d, PackageDescriptor::latest("acme"));
    }

    #[test]
    fn descriptor_display() {
        assert_eq!(PackageDescriptor::latest("a").to_string(), "a@latest");
        assert_eq!(PackageDescriptor::exact("a", "1.0.0").to_string(), "a@1.0.0");
        assert_eq!(
            PackageDescriptor::latest("a").with_prerelease(true).to_string(),
            "a@latest (prerelease)"
        );
    }
}
