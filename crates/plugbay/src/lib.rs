// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugbay - plugin package provisioning and capability composition.
//!
//! Provisions plugin packages from a registry into an installation root and
//! hands back a [`ContainerBuilder`] preloaded with the selected binaries.
//!
//! ```no_run
//! # async fn run() -> Result<(), plugbay::PlugbayError> {
//! use std::sync::Arc;
//! use plugbay::{PackageDescriptor, RegistrationTable};
//!
//! let config = plugbay::load_and_validate().expect("config errors");
//! let builder = plugbay::install(
//!     &config,
//!     &[PackageDescriptor::latest("acme.greeter")],
//!     &config.install.root_path(),
//! )
//! .await?;
//! let registry = builder
//!     .with_scanner(Arc::new(RegistrationTable::new()))
//!     .build()?;
//! # let _ = registry;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

pub use plugbay_config::{
    ConfigError, PlugbayConfig, UnresolvedPolicy, load_and_validate, load_and_validate_path,
    load_and_validate_str, render_errors,
};
pub use plugbay_container::{
    BindingInfo, CapabilityRegistry, ContainerBuilder, Exports, Module, ModuleScanner,
    ModuleSource, RegistrationTable, Sharing,
};
pub use plugbay_core::{
    PackageDescriptor, PackageIdentity, Platform, PlugbayError, validate_package_id,
};
pub use plugbay_provision::{
    InstallReport, Manifest, ManifestStore, ProvisionedPackage, Provisioner, UnresolvedPackage,
};
pub use plugbay_registry::registry_from_config;

/// Provisions `descriptors` into `root` using the registry and install
/// settings of `config`, and returns a builder holding the selected binaries.
pub async fn install(
    config: &PlugbayConfig,
    descriptors: &[PackageDescriptor],
    root: &Path,
) -> Result<ContainerBuilder, PlugbayError> {
    let client = registry_from_config(config)?;
    let provisioner = Provisioner::from_config(config, client)?;
    let (_, builder) = provision(&provisioner, root, descriptors).await?;
    Ok(builder)
}

/// Runs `provisioner` and returns its report together with a builder
/// holding every selected binary, in report order.
pub async fn provision(
    provisioner: &Provisioner,
    root: &Path,
    descriptors: &[PackageDescriptor],
) -> Result<(InstallReport, ContainerBuilder), PlugbayError> {
    let report = provisioner.install(root, descriptors).await?;
    let mut builder = ContainerBuilder::new();
    builder.add_files(report.files());
    Ok((report, builder))
}
