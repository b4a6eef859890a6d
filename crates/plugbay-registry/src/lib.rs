// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Package registry clients.
//!
//! Two implementations of [`RegistryClient`] are provided: an HTTP client for
//! flat-container registries and a folder client for offline feeds.

pub mod folder;
pub mod http;

use std::sync::Arc;
use std::time::Duration;

use plugbay_config::PlugbayConfig;
use plugbay_core::{PlugbayError, RegistryClient};
use tracing::debug;

pub use folder::FolderRegistryClient;
pub use http::HttpRegistryClient;

/// Builds the registry client named by `config.registry.source`.
pub fn registry_from_config(
    config: &PlugbayConfig,
) -> Result<Arc<dyn RegistryClient>, PlugbayError> {
    let source = config.registry.source.trim();
    if config.registry.is_remote() {
        debug!(source = %source, "using HTTP registry");
        let timeout = Duration::from_secs(config.registry.timeout_secs);
        Ok(Arc::new(HttpRegistryClient::new(source, timeout)?))
    } else {
        debug!(source = %source, "using folder registry");
        Ok(Arc::new(FolderRegistryClient::new(source)))
    }
}
