// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent record of what was requested and what is installed in a root.
//!
//! The manifest is a pretty-printed JSON file, `plugbay.json`, at the top of
//! the installation root. Writes go through a sibling temp file and a rename
//! so a crash never leaves a half-written manifest behind.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use plugbay_core::{
    InstallObserver, InstalledPackage, PackageDescriptor, PackageIdentity, PlugbayError,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// File name of the manifest inside an installation root.
pub const MANIFEST_FILE: &str = "plugbay.json";

/// The only persisted provisioning state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub requested_packages: BTreeSet<PackageDescriptor>,
    #[serde(default)]
    pub installed_packages: BTreeSet<InstalledPackage>,
}

/// Reads and writes the manifest of one installation root.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    root: PathBuf,
}

impl ManifestStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// Loads the manifest, or an empty one when no file exists yet.
    pub fn load(&self) -> Result<Manifest, PlugbayError> {
        let path = self.path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no manifest yet, starting empty");
                return Ok(Manifest::default());
            }
            Err(e) => return Err(corrupt(path, format!("read failed: {e}"), Some(e))),
        };

        serde_json::from_str(&content)
            .map_err(|e| corrupt(path, format!("invalid JSON: {e}"), Some(e)))
    }

    /// Persists `manifest`, creating the root if needed.
    pub fn save(&self, manifest: &Manifest) -> Result<(), PlugbayError> {
        let path = self.path();
        std::fs::create_dir_all(&self.root).map_err(|e| PlugbayError::Io {
            path: self.root.clone(),
            source: e,
        })?;

        let json = serde_json::to_string_pretty(manifest)
            .map_err(|e| PlugbayError::Internal(format!("failed to serialize manifest: {e}")))?;

        let tmp = self.root.join(format!("{MANIFEST_FILE}.tmp"));
        std::fs::write(&tmp, json).map_err(|e| PlugbayError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| PlugbayError::Io { path, source: e })?;
        Ok(())
    }

    /// Brings the root in line with `requested` before any download happens.
    ///
    /// When the stored requested set differs from `requested`, the whole root
    /// is deleted and recreated empty and the installed records are dropped.
    /// The manifest is then written back with `requested` as its requested set.
    pub fn reconcile(
        &self,
        requested: &BTreeSet<PackageDescriptor>,
    ) -> Result<Manifest, PlugbayError> {
        let mut manifest = self.load()?;

        if manifest.requested_packages != *requested {
            if self.root.exists() {
                warn!(
                    root = %self.root.display(),
                    previous = manifest.requested_packages.len(),
                    requested = requested.len(),
                    "requested packages changed, resetting installation root"
                );
                std::fs::remove_dir_all(&self.root).map_err(|e| PlugbayError::Io {
                    path: self.root.clone(),
                    source: e,
                })?;
            }
            std::fs::create_dir_all(&self.root).map_err(|e| PlugbayError::Io {
                path: self.root.clone(),
                source: e,
            })?;
            manifest = Manifest {
                requested_packages: requested.clone(),
                installed_packages: BTreeSet::new(),
            };
        }

        self.save(&manifest)?;
        Ok(manifest)
    }

    /// Adds an installed record and persists.
    pub fn record_installed(&self, record: InstalledPackage) -> Result<(), PlugbayError> {
        let mut manifest = self.load()?;
        if manifest.installed_packages.insert(record.clone()) {
            self.save(&manifest)?;
            debug!(package = %record.id, "recorded install");
        }
        Ok(())
    }

    /// Removes the records matching `identity` and persists.
    ///
    /// Records without a version match on id alone.
    pub fn record_uninstalled(&self, identity: &PackageIdentity) -> Result<(), PlugbayError> {
        let mut manifest = self.load()?;
        let version = identity.version.to_string();
        let before = manifest.installed_packages.len();
        manifest.installed_packages.retain(|r| {
            !(r.id == identity.id && r.version.as_deref().is_none_or(|v| v == version))
        });
        if manifest.installed_packages.len() != before {
            self.save(&manifest)?;
            debug!(package = %identity, "recorded uninstall");
        }
        Ok(())
    }
}

fn corrupt<E>(path: PathBuf, message: String, source: Option<E>) -> PlugbayError
where
    E: std::error::Error + Send + Sync + 'static,
{
    PlugbayError::ManifestCorrupt {
        path,
        message,
        source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
    }
}

/// Observer that keeps the manifest's installed set in sync with the pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManifestRecorder;

impl InstallObserver for ManifestRecorder {
    fn on_installed(&self, root: &Path, identity: &PackageIdentity) -> Result<(), PlugbayError> {
        info!(package = %identity, "installed package");
        ManifestStore::new(root).record_installed(InstalledPackage::from(identity))
    }

    fn on_uninstalled(
        &self,
        root: &Path,
        identity: &PackageIdentity,
    ) -> Result<(), PlugbayError> {
        info!(package = %identity, "uninstalled package");
        ManifestStore::new(root).record_uninstalled(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;

    fn set(descriptors: &[PackageDescriptor]) -> BTreeSet<PackageDescriptor> {
        descriptors.iter().cloned().collect()
    }

    #[test]
    fn load_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path().join("root"));
        assert_eq!(store.load().unwrap(), Manifest::default());
    }

    #[test]
    fn save_then_load_is_set_equal() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path());
        let manifest = Manifest {
            requested_packages: set(&[
                PackageDescriptor::exact("b", "1.0.0"),
                PackageDescriptor::latest("a").with_prerelease(true),
            ]),
            installed_packages: [InstalledPackage {
                id: "b".into(),
                version: Some("1.0.0".into()),
            }]
            .into_iter()
            .collect(),
        };
        store.save(&manifest).unwrap();
        assert_eq!(store.load().unwrap(), manifest);
    }

    #[test]
    fn file_uses_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path());
        store
            .reconcile(&set(&[PackageDescriptor::latest("a")]))
            .unwrap();
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"requestedPackages\""));
        assert!(raw.contains("\"installedPackages\""));
    }

    #[test]
    fn corrupt_manifest_is_fatal_and_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path());
        std::fs::write(store.path(), "{ not json").unwrap();

        let err = store.reconcile(&BTreeSet::new()).unwrap_err();
        assert!(matches!(err, PlugbayError::ManifestCorrupt { .. }));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{ not json");
    }

    #[test]
    fn write_failure_is_io_not_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path());
        std::fs::create_dir(dir.path().join(format!("{MANIFEST_FILE}.tmp"))).unwrap();

        let err = store.save(&Manifest::default()).unwrap_err();
        assert!(matches!(err, PlugbayError::Io { .. }), "got {err:?}");
        assert!(!store.path().exists());
    }

    #[test]
    fn reconcile_same_set_keeps_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path());
        let requested = set(&[PackageDescriptor::exact("a", "1.0.0")]);
        store.reconcile(&requested).unwrap();

        std::fs::create_dir(dir.path().join("a.1.0.0")).unwrap();
        store
            .record_installed(InstalledPackage {
                id: "a".into(),
                version: Some("1.0.0".into()),
            })
            .unwrap();

        let manifest = store.reconcile(&requested).unwrap();
        assert_eq!(manifest.installed_packages.len(), 1);
        assert!(dir.path().join("a.1.0.0").exists());
    }

    #[test]
    fn reconcile_changed_set_wipes_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        let store = ManifestStore::new(&root);
        store
            .reconcile(&set(&[PackageDescriptor::exact("a", "1.0.0")]))
            .unwrap();
        std::fs::create_dir(root.join("a.1.0.0")).unwrap();
        store
            .record_installed(InstalledPackage {
                id: "a".into(),
                version: Some("1.0.0".into()),
            })
            .unwrap();

        let new_set = set(&[PackageDescriptor::exact("a", "2.0.0")]);
        let manifest = store.reconcile(&new_set).unwrap();

        assert!(!root.join("a.1.0.0").exists());
        assert!(manifest.installed_packages.is_empty());
        assert_eq!(store.load().unwrap().requested_packages, new_set);
    }

    #[test]
    fn recorder_tracks_install_and_uninstall() {
        let dir = tempfile::tempdir().unwrap();
        let identity = PackageIdentity::new("acme", Version::new(1, 2, 0));

        ManifestRecorder.on_installed(dir.path(), &identity).unwrap();
        let manifest = ManifestStore::new(dir.path()).load().unwrap();
        assert!(manifest.installed_packages.contains(&InstalledPackage::from(&identity)));

        ManifestRecorder.on_uninstalled(dir.path(), &identity).unwrap();
        let manifest = ManifestStore::new(dir.path()).load().unwrap();
        assert!(manifest.installed_packages.is_empty());
    }

    #[test]
    fn uninstall_leaves_other_versions() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path());
        for v in ["1.0.0", "2.0.0"] {
            store
                .record_installed(InstalledPackage {
                    id: "acme".into(),
                    version: Some(v.into()),
                })
                .unwrap();
        }
        store
            .record_uninstalled(&PackageIdentity::new("acme", Version::new(1, 0, 0)))
            .unwrap();
        let remaining: Vec<_> = store.load().unwrap().installed_packages.into_iter().collect();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].version.as_deref(), Some("2.0.0"));
    }
}
