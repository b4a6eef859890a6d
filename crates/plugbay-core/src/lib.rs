// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Plugbay provisioning engine.
//!
//! This crate provides the error type, the value types describing requested
//! and installed packages, platform tokens, version resolution, and the trait
//! seams (registry client, install observer) used throughout the workspace.

pub mod error;
pub mod platform;
pub mod traits;
pub mod types;
pub mod version;

// Re-export key items at crate root for ergonomic imports.
pub use error::PlugbayError;
pub use platform::{Compatibility, Platform};
pub use traits::{ArchiveStream, InstallObserver, RegistryClient};
pub use types::{
    InstalledPackage, PackageDescriptor, PackageIdentity, VariantGroup, VersionMetadata,
    validate_package_id,
};
pub use version::{parse_versions, resolve_version};
