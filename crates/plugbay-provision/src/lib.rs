// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Package provisioning for Plugbay.
//!
//! Resolves requested packages against a registry, downloads and extracts
//! them into an installation root tracked by a manifest, and selects the
//! binary variant that fits the target platform.

pub mod archive;
pub mod manifest;
pub mod package;
pub mod pipeline;
pub mod selector;

pub use manifest::{MANIFEST_FILE, Manifest, ManifestRecorder, ManifestStore};
pub use package::{PACKAGE_MANIFEST, PackageManifest, parse_package_manifest};
pub use pipeline::{InstallReport, ProvisionedPackage, Provisioner, UnresolvedPackage};
pub use selector::select;
