// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./plugbay.toml` > `~/.config/plugbay/plugbay.toml` > `/etc/plugbay/plugbay.toml`
//! with environment variable overrides via `PLUGBAY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PlugbayConfig;

pub(crate) const SYSTEM_CONFIG: &str = "/etc/plugbay/plugbay.toml";
pub(crate) const LOCAL_CONFIG: &str = "plugbay.toml";

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("plugbay/plugbay.toml"))
        .unwrap_or_default()
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/plugbay/plugbay.toml` (system-wide)
/// 3. `~/.config/plugbay/plugbay.toml` (user XDG config)
/// 4. `./plugbay.toml` (local directory)
/// 5. `PLUGBAY_*` environment variables
pub fn load_config() -> Result<PlugbayConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and embedded configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<PlugbayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlugbayConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PlugbayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlugbayConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PlugbayConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `PLUGBAY_INSTALL_ON_UNRESOLVED` must map to
/// `install.on_unresolved`, not `install.on.unresolved`.
fn env_provider() -> Env {
    Env::prefixed("PLUGBAY_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        let mapped = key
            .as_str()
            .replacen("registry_", "registry.", 1)
            .replacen("install_", "install.", 1)
            .replacen("log_", "log.", 1);
        mapped.into()
    })
}
