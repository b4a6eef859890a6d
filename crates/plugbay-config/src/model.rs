// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Plugbay provisioning engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use plugbay_core::PackageDescriptor;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level Plugbay configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlugbayConfig {
    /// Package registry settings.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Installation root and provisioning policy.
    #[serde(default)]
    pub install: InstallConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Packages to provision, one `[[packages]]` entry each.
    #[serde(default)]
    pub packages: Vec<PackageDescriptor>,
}

/// Package registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Registry base URL (`http://` or `https://`) or a local directory of
    /// `<id>.<version>.tar.gz` archives.
    #[serde(default = "default_registry_source")]
    pub source: String,

    /// Request timeout for registry calls, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            source: default_registry_source(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RegistryConfig {
    /// Returns true when `source` names a remote HTTP registry.
    pub fn is_remote(&self) -> bool {
        let source = self.source.trim();
        source.starts_with("http://") || source.starts_with("https://")
    }
}

fn default_registry_source() -> String {
    "https://registry.plugbay.dev/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// What to do when a requested package cannot be resolved.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Record the failure in the install report and continue.
    #[default]
    Skip,
    /// Abort the whole provisioning session.
    Fail,
}

/// Installation root and provisioning policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InstallConfig {
    /// Directory owned by the provisioning manifest.
    #[serde(default = "default_install_root")]
    pub root: String,

    /// Platform token overriding the host platform (e.g. `x86_64-linux-gnu`).
    #[serde(default)]
    pub target_platform: Option<String>,

    /// Behavior when a package cannot be resolved.
    #[serde(default)]
    pub on_unresolved: UnresolvedPolicy,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            root: default_install_root(),
            target_platform: None,
            on_unresolved: UnresolvedPolicy::default(),
        }
    }
}

impl InstallConfig {
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(&self.root)
    }
}

fn default_install_root() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("plugbay").join("packages"))
        .unwrap_or_else(|| PathBuf::from(".plugbay/packages"))
        .display()
        .to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
