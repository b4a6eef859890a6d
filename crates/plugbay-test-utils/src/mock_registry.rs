// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory registry client for deterministic pipeline tests.
//!
//! `MockRegistry` implements `RegistryClient` over archives held in memory
//! and counts calls, so tests can assert that a run did no downloads.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use plugbay_core::{
    ArchiveStream, PackageDescriptor, PackageIdentity, PlugbayError, RegistryClient,
    VersionMetadata, resolve_version,
};
use semver::Version;
use tokio::sync::Mutex;
use tracing::debug;

/// Archive bytes keyed by lower-cased id, then version.
type Catalog = HashMap<String, BTreeMap<Version, Vec<u8>>>;

/// A registry client serving archives from memory.
#[derive(Default)]
pub struct MockRegistry {
    catalog: Mutex<Catalog>,
    find_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    fail_downloads: AtomicBool,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an archive while building the registry.
    pub fn with_package(mut self, id: &str, version: &str, archive: Vec<u8>) -> Self {
        if let Ok(version) = Version::parse(version) {
            self.catalog
                .get_mut()
                .entry(id.to_lowercase())
                .or_default()
                .insert(version, archive);
        }
        self
    }

    /// Adds or replaces an archive on a shared registry.
    pub async fn publish(&self, id: &str, version: &str, archive: Vec<u8>) {
        if let Ok(version) = Version::parse(version) {
            self.catalog
                .lock()
                .await
                .entry(id.to_lowercase())
                .or_default()
                .insert(version, archive);
        }
    }

    /// Makes every subsequent `fetch_archive` fail with `DownloadFailed`.
    pub fn fail_downloads(&self, fail: bool) {
        self.fail_downloads.store(fail, Ordering::SeqCst);
    }

    /// Number of `find` calls served so far.
    pub fn find_count(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    /// Number of `fetch_archive` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryClient for MockRegistry {
    fn source(&self) -> &str {
        "mock://registry"
    }

    async fn find(
        &self,
        id: &str,
        version: Option<&str>,
        allow_prerelease: bool,
    ) -> Result<Option<VersionMetadata>, PlugbayError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        let requested = PackageDescriptor {
            id: id.to_string(),
            version: version.map(str::to_string),
            prerelease: allow_prerelease,
        }
        .requested_version()?;

        let catalog = self.catalog.lock().await;
        let Some(versions) = catalog.get(&id.to_lowercase()) else {
            return Ok(None);
        };
        Ok(
            resolve_version(versions.keys(), requested.as_ref(), allow_prerelease)
                .map(|v| VersionMetadata::new(PackageIdentity::new(id, v))),
        )
    }

    async fn fetch_archive(
        &self,
        identity: &PackageIdentity,
    ) -> Result<ArchiveStream, PlugbayError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        debug!(package = %identity, "mock registry fetch");

        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(PlugbayError::DownloadFailed {
                package: identity.to_string(),
                message: "injected download failure".to_string(),
                source: None,
            });
        }

        let catalog = self.catalog.lock().await;
        let archive = catalog
            .get(&identity.id.to_lowercase())
            .and_then(|versions| versions.get(&identity.version))
            .cloned()
            .ok_or_else(|| PlugbayError::DownloadFailed {
                package: identity.to_string(),
                message: "archive not found".to_string(),
                source: None,
            })?;

        let chunks: Vec<Result<Bytes, PlugbayError>> = archive
            .chunks(1024)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Ok(Box::pin(stream::iter(chunks)))
    }
}
