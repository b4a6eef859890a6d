// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Plugbay provisioning engine.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// The primary error type used across provisioning, registry clients, and
/// capability composition.
#[derive(Debug, Error)]
pub enum PlugbayError {
    /// Configuration errors (invalid TOML, bad descriptor, unparsable version).
    #[error("configuration error: {0}")]
    Config(String),

    /// No version of the package satisfied the request.
    #[error(
        "package '{id}' not found (version constraint: {}, prerelease: {prerelease}){}",
        constraint.as_deref().unwrap_or("latest"),
        in_root(root)
    )]
    PackageNotFound {
        id: String,
        constraint: Option<String>,
        prerelease: bool,
        root: Option<PathBuf>,
    },

    /// None of the package's variant groups can run on the target platform.
    #[error(
        "package '{package}' has no variant compatible with platform '{platform}' (available: {}){}",
        available.join(", "),
        in_root(root)
    )]
    IncompatiblePlatform {
        package: String,
        platform: String,
        available: Vec<String>,
        root: Option<PathBuf>,
    },

    /// Transport failure while talking to the package registry.
    #[error("download failed for '{package}': {message}")]
    DownloadFailed {
        package: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The archive could not be extracted or its variant manifest is invalid.
    #[error("archive for '{package}' is corrupt: {message}{}", in_root(root))]
    ArchiveCorrupt {
        package: String,
        message: String,
        root: Option<PathBuf>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The installation manifest could not be read or parsed.
    #[error("manifest at {} is corrupt or unreadable: {message}", path.display())]
    ManifestCorrupt {
        path: PathBuf,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No loaded module binds the requested capability.
    #[error("capability '{name}' of type {interface} not found")]
    CapabilityNotFound { name: String, interface: String },

    /// More than one loaded module binds the requested capability.
    #[error(
        "capability '{name}' of type {interface} is ambiguous (bound by: {})",
        contributors.join(", ")
    )]
    AmbiguousCapability {
        name: String,
        interface: String,
        contributors: Vec<String>,
    },

    /// The operation was cancelled before it completed.
    #[error("operation cancelled: {0}")]
    Cancelled(String),

    /// Filesystem errors outside the manifest and archive paths.
    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PlugbayError {
    /// Attaches the installation root to package errors that lack one.
    pub fn with_root(mut self, path: &Path) -> Self {
        match &mut self {
            PlugbayError::PackageNotFound { root, .. }
            | PlugbayError::IncompatiblePlatform { root, .. }
            | PlugbayError::ArchiveCorrupt { root, .. } => {
                if root.is_none() {
                    *root = Some(path.to_path_buf());
                }
            }
            _ => {}
        }
        self
    }

    /// Returns true for errors that leave the installation root in an
    /// unreliable state and must abort the provisioning session.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PlugbayError::PackageNotFound { .. })
    }
}

fn in_root(root: &Option<PathBuf>) -> String {
    root.as_ref()
        .map(|r| format!(" in root {}", r.display()))
        .unwrap_or_default()
}
