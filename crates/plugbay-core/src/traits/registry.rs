// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry client trait for resolving package versions and fetching archives.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;

use crate::error::PlugbayError;
use crate::types::{PackageIdentity, VersionMetadata};

/// Stream of archive bytes as delivered by a registry client.
pub type ArchiveStream = Pin<Box<dyn Stream<Item = Result<Bytes, PlugbayError>> + Send>>;

/// Client for a package registry.
///
/// Implementations resolve an id plus an optional exact version to concrete
/// version metadata, and stream a package archive for a resolved identity.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Human-readable description of the source (URL or directory).
    fn source(&self) -> &str;

    /// Resolves a package version.
    ///
    /// With `version` set only an exact match is returned. Otherwise the
    /// highest eligible version is returned, honoring `allow_prerelease`.
    /// `Ok(None)` means no version qualified.
    async fn find(
        &self,
        id: &str,
        version: Option<&str>,
        allow_prerelease: bool,
    ) -> Result<Option<VersionMetadata>, PlugbayError>;

    /// Streams the archive bytes for a resolved package.
    async fn fetch_archive(&self, identity: &PackageIdentity)
        -> Result<ArchiveStream, PlugbayError>;
}
