// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The provisioning pipeline: resolve, download, extract, select.
//!
//! Descriptors are processed one after another. Installs into the same root
//! are serialized by a per-root lock; different roots proceed independently.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use plugbay_config::{PlugbayConfig, UnresolvedPolicy};
use plugbay_core::{
    InstallObserver, InstalledPackage, PackageDescriptor, PackageIdentity, Platform, PlugbayError,
    RegistryClient,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::archive::{install_archive, is_installed, package_dir};
use crate::manifest::{ManifestRecorder, ManifestStore};
use crate::package::read_package_manifest;
use crate::selector::select;

/// One package that made it through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedPackage {
    pub identity: PackageIdentity,
    /// Platform token of the selected variant group.
    pub platform: String,
    /// Absolute paths of the selected binaries, in declaration order.
    pub files: Vec<PathBuf>,
    /// True when the package was already present and nothing was downloaded.
    pub reused: bool,
}

/// A descriptor that resolved to no version, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedPackage {
    pub descriptor: PackageDescriptor,
    pub reason: String,
}

/// Outcome of [`Provisioner::install`].
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub root: PathBuf,
    pub target: Platform,
    pub packages: Vec<ProvisionedPackage>,
    pub unresolved: Vec<UnresolvedPackage>,
}

impl InstallReport {
    /// Every selected binary path, package by package.
    pub fn files(&self) -> Vec<PathBuf> {
        self.packages
            .iter()
            .flat_map(|p| p.files.iter().cloned())
            .collect()
    }

    /// Packages that were downloaded during this run.
    pub fn installed(&self) -> impl Iterator<Item = &ProvisionedPackage> {
        self.packages.iter().filter(|p| !p.reused)
    }

    /// Packages that were already present.
    pub fn reused(&self) -> impl Iterator<Item = &ProvisionedPackage> {
        self.packages.iter().filter(|p| p.reused)
    }
}

impl fmt::Display for InstallReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} installed, {} reused, {} unresolved ({} files) in {}",
            self.installed().count(),
            self.reused().count(),
            self.unresolved.len(),
            self.packages.iter().map(|p| p.files.len()).sum::<usize>(),
            self.root.display()
        )
    }
}

/// Drives the provisioning pipeline against one registry client.
pub struct Provisioner {
    client: Arc<dyn RegistryClient>,
    target: Platform,
    on_unresolved: UnresolvedPolicy,
    observers: Vec<Arc<dyn InstallObserver>>,
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
    cancel: CancellationToken,
}

impl fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provisioner")
            .field("source", &self.client.source())
            .field("target", &self.target)
            .field("on_unresolved", &self.on_unresolved)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Provisioner {
    /// Provisioner for the host platform that records installs in the manifest.
    pub fn new(client: Arc<dyn RegistryClient>) -> Self {
        Self {
            client,
            target: Platform::host(),
            on_unresolved: UnresolvedPolicy::default(),
            observers: vec![Arc::new(ManifestRecorder)],
            locks: DashMap::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Applies `[install]` settings from the configuration.
    pub fn from_config(
        config: &PlugbayConfig,
        client: Arc<dyn RegistryClient>,
    ) -> Result<Self, PlugbayError> {
        let mut provisioner =
            Self::new(client).with_unresolved_policy(config.install.on_unresolved);
        if let Some(token) = &config.install.target_platform {
            provisioner = provisioner.with_target(token.parse()?);
        }
        Ok(provisioner)
    }

    pub fn with_target(mut self, target: Platform) -> Self {
        self.target = target;
        self
    }

    pub fn with_unresolved_policy(mut self, policy: UnresolvedPolicy) -> Self {
        self.on_unresolved = policy;
        self
    }

    /// Adds an observer notified after every install and uninstall.
    pub fn with_observer(mut self, observer: Arc<dyn InstallObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn target(&self) -> &Platform {
        &self.target
    }

    /// Waits for exclusive use of `root`.
    ///
    /// `root` and `root/.` share one lock. The entry is dropped from the map
    /// once no task holds or waits on it.
    async fn lock_root(&self, root: &Path) -> RootLease<'_> {
        let key: PathBuf = std::path::absolute(root)
            .unwrap_or_else(|_| root.to_path_buf())
            .components()
            .collect();
        let lock = self.locks.entry(key.clone()).or_default().clone();
        RootLease {
            locks: &self.locks,
            key,
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn tracked_roots(&self) -> usize {
        self.locks.len()
    }

    /// Provisions `descriptors` into `root`.
    ///
    /// The manifest is reconciled first, so a changed request set wipes the
    /// root before anything is downloaded. Packages already extracted in the
    /// root are reused without touching the registry's archive endpoint.
    pub async fn install(
        &self,
        root: &Path,
        descriptors: &[PackageDescriptor],
    ) -> Result<InstallReport, PlugbayError> {
        for descriptor in descriptors {
            descriptor.validate()?;
        }

        let _lease = self.lock_root(root).await;

        let requested: BTreeSet<PackageDescriptor> = descriptors.iter().cloned().collect();
        let store = ManifestStore::new(root);
        tokio::task::spawn_blocking(move || store.reconcile(&requested))
            .await
            .map_err(|e| PlugbayError::Internal(format!("manifest task failed: {e}")))??;

        info!(
            root = %root.display(),
            target = %self.target,
            packages = descriptors.len(),
            source = %self.client.source(),
            "provisioning packages"
        );

        let mut report = InstallReport {
            root: root.to_path_buf(),
            target: self.target.clone(),
            packages: Vec::new(),
            unresolved: Vec::new(),
        };

        let mut seen = BTreeSet::new();
        for descriptor in descriptors {
            if !seen.insert(descriptor) {
                continue;
            }
            if self.cancel.is_cancelled() {
                return Err(PlugbayError::Cancelled(format!(
                    "provisioning cancelled before {descriptor}"
                )));
            }

            match self
                .provision_one(root, descriptor)
                .await
                .map_err(|e| e.with_root(root))
            {
                Ok(package) => report.packages.push(package),
                Err(err) if !err.is_fatal() && self.on_unresolved == UnresolvedPolicy::Skip => {
                    warn!(package = %descriptor, error = %err, "skipping unresolved package");
                    report.unresolved.push(UnresolvedPackage {
                        descriptor: descriptor.clone(),
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        info!(root = %root.display(), "{report}");
        Ok(report)
    }

    async fn provision_one(
        &self,
        root: &Path,
        descriptor: &PackageDescriptor,
    ) -> Result<ProvisionedPackage, PlugbayError> {
        let identity = self.resolve(descriptor).await?;
        let dir = package_dir(root, &identity);

        let reused = is_installed(root, &identity);
        if reused {
            debug!(package = %identity, "package already extracted, skipping download");
            // Restores the record if a previous run stopped between commit and notification.
            ManifestStore::new(root).record_installed(InstalledPackage::from(&identity))?;
        } else {
            let stream = tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(PlugbayError::Cancelled(format!("download of {identity} cancelled")));
                }
                stream = self.client.fetch_archive(&identity) => stream?,
            };
            install_archive(stream, root, &identity, &self.cancel).await?;
            for observer in &self.observers {
                observer.on_installed(root, &identity)?;
            }
        }

        let manifest = read_package_manifest(&dir, &identity).await?;
        let group = select(&identity.to_string(), &manifest.variants, &self.target)?;
        debug!(
            package = %identity,
            variant = %group.platform,
            items = group.items.len(),
            "selected variant group"
        );

        Ok(ProvisionedPackage {
            files: group.items.iter().map(|item| dir.join(item)).collect(),
            platform: group.platform.clone(),
            identity,
            reused,
        })
    }

    async fn resolve(&self, descriptor: &PackageDescriptor) -> Result<PackageIdentity, PlugbayError> {
        let found = tokio::select! {
            _ = self.cancel.cancelled() => {
                return Err(PlugbayError::Cancelled(format!("resolution of {descriptor} cancelled")));
            }
            found = self.client.find(
                &descriptor.id,
                descriptor.version.as_deref(),
                descriptor.prerelease,
            ) => found?,
        };

        match found {
            Some(metadata) => {
                debug!(package = %descriptor, resolved = %metadata.identity, "resolved version");
                Ok(metadata.identity)
            }
            None => Err(PlugbayError::PackageNotFound {
                id: descriptor.id.clone(),
                constraint: descriptor.version.clone(),
                prerelease: descriptor.prerelease,
                root: None,
            }),
        }
    }

    /// Removes an installed package directory from `root`.
    ///
    /// Observers are notified even when the directory was already gone, so
    /// stale manifest records get cleared. Returns whether a directory was
    /// removed.
    pub async fn uninstall(
        &self,
        root: &Path,
        identity: &PackageIdentity,
    ) -> Result<bool, PlugbayError> {
        let _lease = self.lock_root(root).await;

        let dir = package_dir(root, identity);
        let removed = match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                return Err(PlugbayError::Io {
                    path: dir,
                    source: e,
                });
            }
        };

        for observer in &self.observers {
            observer.on_uninstalled(root, identity)?;
        }

        if removed {
            info!(package = %identity, root = %root.display(), "package removed");
        } else {
            debug!(package = %identity, "package directory was not present");
        }
        Ok(removed)
    }
}

/// Exclusive hold on one installation root.
struct RootLease<'a> {
    locks: &'a DashMap<PathBuf, Arc<Mutex<()>>>,
    key: PathBuf,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for RootLease<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
