// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Download and extraction of package archives (gzip-compressed tarballs).
//!
//! Archives are spooled to a staging directory inside the installation root,
//! unpacked on the blocking pool, and moved into `<root>/<id>.<version>/`
//! with a single rename. Anything short of a complete extraction leaves no
//! package directory behind.

use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use futures::StreamExt;
use plugbay_core::{ArchiveStream, PackageIdentity, PlugbayError};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::package::PACKAGE_MANIFEST;

const STAGING_PREFIX: &str = ".staging-";

/// Directory a package occupies inside `root`.
pub fn package_dir(root: &Path, identity: &PackageIdentity) -> PathBuf {
    root.join(identity.dir_name())
}

/// True when `root` already holds a fully extracted copy of the package.
pub fn is_installed(root: &Path, identity: &PackageIdentity) -> bool {
    package_dir(root, identity).join(PACKAGE_MANIFEST).is_file()
}

/// Spools `stream` to disk, unpacks it, and commits it under `root`.
///
/// Returns the committed package directory.
pub async fn install_archive(
    stream: ArchiveStream,
    root: &Path,
    identity: &PackageIdentity,
    cancel: &CancellationToken,
) -> Result<PathBuf, PlugbayError> {
    let package = identity.to_string();
    let dest = package_dir(root, identity);

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(root)
        .map_err(|e| PlugbayError::Io {
            path: root.to_path_buf(),
            source: e,
        })?;

    let archive_path = staging.path().join("archive.tar.gz");
    let size = spool(stream, &archive_path, &package, cancel).await?;
    debug!(package = %package, bytes = size, "archive downloaded");

    let unpack_dir = staging.path().join("package");
    let entries = {
        let archive_path = archive_path.clone();
        let unpack_dir = unpack_dir.clone();
        let package = package.clone();
        tokio::task::spawn_blocking(move || unpack(&archive_path, &unpack_dir, &package))
            .await
            .map_err(|e| PlugbayError::Internal(format!("extraction task failed: {e}")))??
    };

    if !unpack_dir.join(PACKAGE_MANIFEST).is_file() {
        return Err(PlugbayError::ArchiveCorrupt {
            package,
            message: format!("archive has no {PACKAGE_MANIFEST} at its root"),
            root: None,
            source: None,
        });
    }

    if cancel.is_cancelled() {
        return Err(PlugbayError::Cancelled(format!(
            "installation of {package} cancelled before commit"
        )));
    }

    // Callers only get here when `dest` is not installed, so anything there is leftover.
    match tokio::fs::remove_dir_all(&dest).await {
        Ok(()) => warn!(
            package = %package,
            dir = %dest.display(),
            "replaced incomplete package directory"
        ),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(PlugbayError::Io {
                path: dest.clone(),
                source: e,
            });
        }
    }

    tokio::fs::rename(&unpack_dir, &dest)
        .await
        .map_err(|e| PlugbayError::Io {
            path: dest.clone(),
            source: e,
        })?;

    info!(package = %package, entries, dir = %dest.display(), "package extracted");
    Ok(dest)
}

/// Writes the archive stream to `path`, stopping early on cancellation.
async fn spool(
    mut stream: ArchiveStream,
    path: &Path,
    package: &str,
    cancel: &CancellationToken,
) -> Result<u64, PlugbayError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| PlugbayError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut written = 0u64;
    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(PlugbayError::Cancelled(format!("download of {package} cancelled")));
            }
            chunk = stream.next() => chunk,
        };
        let Some(chunk) = chunk else { break };
        let chunk = chunk?;
        file.write_all(&chunk).await.map_err(|e| PlugbayError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| PlugbayError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(written)
}

/// Unpacks a tar.gz file into `dest`, rejecting entries that would escape it.
fn unpack(archive: &Path, dest: &Path, package: &str) -> Result<usize, PlugbayError> {
    let file = std::fs::File::open(archive).map_err(|e| PlugbayError::Io {
        path: archive.to_path_buf(),
        source: e,
    })?;
    std::fs::create_dir_all(dest).map_err(|e| PlugbayError::Io {
        path: dest.to_path_buf(),
        source: e,
    })?;

    let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    let mut count = 0;
    for entry in tar.entries().map_err(|e| corrupt(package, "unreadable archive", e))? {
        let mut entry = entry.map_err(|e| corrupt(package, "unreadable archive entry", e))?;
        let path = entry
            .path()
            .map_err(|e| corrupt(package, "invalid entry path", e))?
            .into_owned();

        if !is_contained(&path) {
            return Err(PlugbayError::ArchiveCorrupt {
                package: package.to_string(),
                message: format!("entry '{}' escapes the package directory", path.display()),
                root: None,
                source: None,
            });
        }

        entry
            .unpack_in(dest)
            .map_err(|e| corrupt(package, "failed to unpack entry", e))?;
        count += 1;
    }

    Ok(count)
}

fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn corrupt(package: &str, what: &str, e: std::io::Error) -> PlugbayError {
    PlugbayError::ArchiveCorrupt {
        package: package.to_string(),
        message: format!("{what}: {e}"),
        root: None,
        source: Some(Box::new(e)),
    }
}
