// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for flat-container package registries.
//!
//! The registry exposes two endpoints per package:
//! - `GET {base}/{id}/index.json` returning `{"versions": ["1.0.0", ...]}`
//! - `GET {base}/{id}/{version}/{id}.{version}.tar.gz` returning the archive
//!
//! Ids and versions are lower-cased in URLs. A 404 on the index means the
//! package is unknown to the registry.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use plugbay_core::{
    ArchiveStream, PackageIdentity, PlugbayError, RegistryClient, VersionMetadata,
    parse_versions, resolve_version, types::PackageDescriptor,
};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

/// Body of `{id}/index.json`.
#[derive(Debug, Deserialize)]
struct PackageIndex {
    versions: Vec<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Registry client speaking the flat-container HTTP layout.
#[derive(Debug, Clone)]
pub struct HttpRegistryClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRegistryClient {
    /// Creates a client for the registry rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PlugbayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("plugbay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PlugbayError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn index_url(&self, id: &str) -> String {
        format!("{}/{}/index.json", self.base_url, id.to_lowercase())
    }

    fn archive_url(&self, identity: &PackageIdentity) -> String {
        let id = identity.id.to_lowercase();
        let version = identity.version.to_string().to_lowercase();
        format!("{}/{id}/{version}/{id}.{version}.tar.gz", self.base_url)
    }

    async fn fetch_index(&self, id: &str) -> Result<Option<PackageIndex>, PlugbayError> {
        let url = self.index_url(id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| download_failed(id, format!("GET {url}: {e}"), e))?;

        let status = response.status();
        debug!(package = %id, status = %status, "registry index response");

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlugbayError::DownloadFailed {
                package: id.to_string(),
                message: format!("GET {url} returned {status}: {body}"),
                source: None,
            });
        }

        let index = response
            .json::<PackageIndex>()
            .await
            .map_err(|e| download_failed(id, format!("invalid index at {url}: {e}"), e))?;
        Ok(Some(index))
    }
}

#[async_trait]
impl RegistryClient for HttpRegistryClient {
    fn source(&self) -> &str {
        &self.base_url
    }

    async fn find(
        &self,
        id: &str,
        version: Option<&str>,
        allow_prerelease: bool,
    ) -> Result<Option<VersionMetadata>, PlugbayError> {
        let requested = PackageDescriptor {
            id: id.to_string(),
            version: version.map(str::to_string),
            prerelease: allow_prerelease,
        }
        .requested_version()?;

        let Some(index) = self.fetch_index(id).await? else {
            return Ok(None);
        };

        let candidates = parse_versions(index.versions.iter().map(String::as_str));
        Ok(
            resolve_version(&candidates, requested.as_ref(), allow_prerelease).map(|v| {
                VersionMetadata {
                    identity: PackageIdentity::new(id, v),
                    description: index.description.clone(),
                }
            }),
        )
    }

    async fn fetch_archive(
        &self,
        identity: &PackageIdentity,
    ) -> Result<ArchiveStream, PlugbayError> {
        let url = self.archive_url(identity);
        let package = identity.to_string();
        info!(package = %package, url = %url, "downloading package archive");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| download_failed(&package, format!("GET {url}: {e}"), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlugbayError::DownloadFailed {
                package,
                message: format!("GET {url} returned {status}"),
                source: None,
            });
        }

        let stream = response.bytes_stream().map(move |chunk| {
            chunk.map_err(|e| download_failed(&package, format!("reading archive body: {e}"), e))
        });
        Ok(Box::pin(stream))
    }
}

fn download_failed(package: &str, message: String, e: reqwest::Error) -> PlugbayError {
    PlugbayError::DownloadFailed {
        package: package.to_string(),
        message,
        source: Some(Box::new(e)),
    }
}
