// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as well-formed package ids, parseable versions, and platform tokens.

use std::collections::HashSet;

use plugbay_core::{Platform, validate_package_id};

use crate::diagnostic::ConfigError;
use crate::model::PlugbayConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &PlugbayConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.registry.source.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "registry.source must not be empty".to_string(),
        });
    }

    if config.registry.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "registry.timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.install.root.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "install.root must not be empty".to_string(),
        });
    }

    if let Some(token) = &config.install.target_platform
        && let Err(e) = token.parse::<Platform>()
    {
        errors.push(ConfigError::Validation {
            message: format!("install.target_platform: {e}"),
        });
    }

    for (i, package) in config.packages.iter().enumerate() {
        if let Err(e) = validate_package_id(&package.id) {
            errors.push(ConfigError::Validation {
                message: format!("packages[{i}].id: {e}"),
            });
        }
        if let Err(e) = package.requested_version() {
            errors.push(ConfigError::Validation {
                message: format!("packages[{i}].version: {e}"),
            });
        }
    }

    // Duplicates collapse in the requested set and would make the manifest
    // disagree with the config file.
    let mut seen = HashSet::new();
    for package in &config.packages {
        if !seen.insert(package) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate package `{package}` in [[packages]] array"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
