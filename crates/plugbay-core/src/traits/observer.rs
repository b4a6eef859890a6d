// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Callbacks fired by the provisioning pipeline after filesystem mutations.

use std::path::Path;

use crate::error::PlugbayError;
use crate::types::PackageIdentity;

/// Observer notified after a package directory is committed to, or removed
/// from, an installation root.
///
/// Errors returned from an observer abort the provisioning session.
pub trait InstallObserver: Send + Sync {
    /// Called once the package has been fully extracted under `root`.
    fn on_installed(&self, root: &Path, identity: &PackageIdentity) -> Result<(), PlugbayError>;

    /// Called once the package directory has been removed from `root`.
    fn on_uninstalled(&self, root: &Path, identity: &PackageIdentity)
        -> Result<(), PlugbayError>;
}
