// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline registry backed by a local directory of `<id>.<version>.tar.gz` files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use plugbay_core::{
    ArchiveStream, PackageDescriptor, PackageIdentity, PlugbayError, RegistryClient,
    VersionMetadata, resolve_version,
};
use semver::Version;
use tokio_util::io::ReaderStream;
use tracing::debug;

const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Registry client reading archives from a flat directory.
///
/// Ids match case-insensitively, mirroring the HTTP registry's lower-cased URLs.
#[derive(Debug, Clone)]
pub struct FolderRegistryClient {
    dir: PathBuf,
    source: String,
}

impl FolderRegistryClient {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let source = dir.display().to_string();
        Self { dir, source }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every parseable version of `id` present in the directory.
    async fn versions_of(&self, id: &str) -> Result<Vec<Version>, PlugbayError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| unavailable(id, &self.dir, e))?;

        let prefix = format!("{}.", id.to_lowercase());
        let mut versions = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| unavailable(id, &self.dir, e))?
        {
            let name = entry.file_name().to_string_lossy().to_lowercase();
            let Some(version) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(ARCHIVE_SUFFIX))
                .and_then(|v| Version::parse(v).ok())
            else {
                continue;
            };
            versions.push(version);
        }

        debug!(package = %id, count = versions.len(), dir = %self.dir.display(), "scanned folder feed");
        Ok(versions)
    }

    fn archive_path(&self, identity: &PackageIdentity) -> PathBuf {
        self.dir.join(format!(
            "{}.{}{ARCHIVE_SUFFIX}",
            identity.id.to_lowercase(),
            identity.version
        ))
    }
}

#[async_trait]
impl RegistryClient for FolderRegistryClient {
    fn source(&self) -> &str {
        &self.source
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

        let versions = self.versions_of(id).await?;
        Ok(
            resolve_version(&versions, requested.as_ref(), allow_prerelease)
                .map(|v| VersionMetadata::new(PackageIdentity::new(id, v))),
        )
    }

    async fn fetch_archive(
        &self,
        identity: &PackageIdentity,
    ) -> Result<ArchiveStream, PlugbayError> {
        let path = self.archive_path(identity);
        let package = identity.to_string();
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| PlugbayError::DownloadFailed {
                package: package.clone(),
                message: format!("cannot open {}: {e}", path.display()),
                source: Some(Box::new(e)),
            })?;

        let stream = ReaderStream::new(file).map(move |chunk| {
            chunk.map_err(|e| PlugbayError::DownloadFailed {
                package: package.clone(),
                message: format!("reading archive: {e}"),
                source: Some(Box::new(e)),
            })
        });
        Ok(Box::pin(stream))
    }
}

fn unavailable(id: &str, dir: &Path, e: std::io::Error) -> PlugbayError {
    PlugbayError::DownloadFailed {
        package: id.to_string(),
        message: format!("package folder {} is unavailable: {e}", dir.display()),
        source: Some(Box::new(e)),
    }
}
