// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the provisioning pipeline against an in-memory registry.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use plugbay_config::UnresolvedPolicy;
use plugbay_core::{
    InstallObserver, InstalledPackage, PackageDescriptor, PackageIdentity, Platform,
    PlugbayError,
};
use plugbay_provision::{ManifestStore, Provisioner};
use plugbay_test_utils::{MockRegistry, PackageArchiveBuilder};
use semver::Version;
use tracing_test::traced_test;

const TARGET: &str = "x86_64-linux-gnu";

fn archive(id: &str, version: &str) -> Vec<u8> {
    PackageArchiveBuilder::new(id, version)
        .variant("aarch64-linux-gnu", &["lib/arm/plugin.so"])
        .variant("x86_64-linux-gnu", &["lib/x64/z.so", "lib/x64/a.so"])
        .variant("any", &["lib/any/plugin.wasm"])
        .build()
        .unwrap()
}

fn registry() -> Arc<MockRegistry> {
    Arc::new(
        MockRegistry::new()
            .with_package("acme.greeter", "1.0.0", archive("acme.greeter", "1.0.0"))
            .with_package("acme.greeter", "1.2.0", archive("acme.greeter", "1.2.0"))
            .with_package("acme.greeter", "2.0.0-beta", archive("acme.greeter", "2.0.0-beta"))
            .with_package("acme.math", "0.23.0", archive("acme.math", "0.23.0"))
            .with_package("acme.math", "0.25.0", archive("acme.math", "0.25.0")),
    )
}

fn provisioner(registry: &Arc<MockRegistry>) -> Provisioner {
    Provisioner::new(registry.clone()).with_target(TARGET.parse::<Platform>().unwrap())
}

#[tokio::test]
async fn second_install_with_same_set_downloads_nothing() {
    let root = tempfile::tempdir().unwrap();
    let registry = registry();
    let provisioner = provisioner(&registry);
    let wanted = vec![
        PackageDescriptor::latest("acme.greeter"),
        PackageDescriptor::exact("acme.math", "0.25.0"),
    ];

    let first = provisioner.install(root.path(), &wanted).await.unwrap();
    assert_eq!(first.installed().count(), 2);
    assert_eq!(registry.fetch_count(), 2);

    let second = provisioner.install(root.path(), &wanted).await.unwrap();
    assert_eq!(second.reused().count(), 2);
    assert_eq!(second.installed().count(), 0);
    assert_eq!(registry.fetch_count(), 2);
    assert_eq!(first.files(), second.files());
}

#[tokio::test]
async fn selected_files_follow_variant_declaration_order() {
    let root = tempfile::tempdir().unwrap();
    let registry = registry();
    let report = provisioner(&registry)
        .install(root.path(), &[PackageDescriptor::latest("acme.greeter")])
        .await
        .unwrap();

    let package_dir = root.path().join("acme.greeter.1.2.0");
    assert_eq!(
        report.files(),
        vec![package_dir.join("lib/x64/z.so"), package_dir.join("lib/x64/a.so")]
    );
    assert_eq!(report.packages[0].platform, "x86_64-linux-gnu");
    assert!(report.files().iter().all(|f| f.is_file()));
}

#[tokio::test]
async fn prerelease_flag_picks_prerelease() {
    let root = tempfile::tempdir().unwrap();
    let registry = registry();
    let report = provisioner(&registry)
        .install(
            root.path(),
            &[PackageDescriptor::latest("acme.greeter").with_prerelease(true)],
        )
        .await
        .unwrap();
    assert_eq!(
        report.packages[0].identity.version,
        Version::parse("2.0.0-beta").unwrap()
    );
}

#[tokio::test]
async fn changed_set_wipes_root_and_reinstalls() {
    let root = tempfile::tempdir().unwrap();
    let registry = registry();
    let provisioner = provisioner(&registry);

    let old = vec![PackageDescriptor::exact("acme.greeter", "1.0.0")];
    provisioner.install(root.path(), &old).await.unwrap();
    assert!(root.path().join("acme.greeter.1.0.0").exists());

    let new = vec![
        PackageDescriptor::exact("acme.greeter", "1.0.0"),
        PackageDescriptor::exact("acme.math", "0.23.0"),
    ];
    let report = provisioner.install(root.path(), &new).await.unwrap();

    // Everything is downloaded again, including the package that was kept.
    assert_eq!(report.installed().count(), 2);
    assert_eq!(registry.fetch_count(), 3);

    let manifest = ManifestStore::new(root.path()).load().unwrap();
    assert_eq!(
        manifest.requested_packages,
        new.iter().cloned().collect::<BTreeSet<_>>()
    );
    assert_eq!(manifest.installed_packages.len(), 2);
}

#[tokio::test]
async fn dropping_a_package_removes_its_directory() {
    let root = tempfile::tempdir().unwrap();
    let registry = registry();
    let provisioner = provisioner(&registry);

    provisioner
        .install(
            root.path(),
            &[
                PackageDescriptor::exact("acme.greeter", "1.0.0"),
                PackageDescriptor::exact("acme.math", "0.23.0"),
            ],
        )
        .await
        .unwrap();
    provisioner
        .install(root.path(), &[PackageDescriptor::exact("acme.math", "0.23.0")])
        .await
        .unwrap();

    assert!(!root.path().join("acme.greeter.1.0.0").exists());
    assert!(root.path().join("acme.math.0.23.0").exists());
}

#[tokio::test]
#[traced_test]
async fn unresolved_package_is_skipped_by_default() {
    let root = tempfile::tempdir().unwrap();
    let registry = registry();
    let report = provisioner(&registry)
        .install(
            root.path(),
            &[
                PackageDescriptor::exact("acme.math", "0.24.0"),
                PackageDescriptor::latest("acme.greeter"),
            ],
        )
        .await
        .unwrap();

    assert_eq!(report.packages.len(), 1);
    assert_eq!(report.unresolved.len(), 1);
    assert_eq!(report.unresolved[0].descriptor.id, "acme.math");
    assert!(report.unresolved[0].reason.contains("0.24.0"));
    assert!(logs_contain("skipping unresolved package"));
}

#[tokio::test]
async fn unresolved_package_fails_under_fail_policy() {
    let root = tempfile::tempdir().unwrap();
    let registry = registry();
    let err = provisioner(&registry)
        .with_unresolved_policy(UnresolvedPolicy::Fail)
        .install(root.path(), &[PackageDescriptor::exact("acme.math", "0.24.0")])
        .await
        .unwrap_err();

    match err {
        PlugbayError::PackageNotFound {
            id,
            constraint,
            root: failed_root,
            ..
        } => {
            assert_eq!(id, "acme.math");
            assert_eq!(constraint.as_deref(), Some("0.24.0"));
            assert_eq!(failed_root.as_deref(), Some(root.path()));
        }
        other => panic!("expected PackageNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn incompatible_platform_is_fatal() {
    let root = tempfile::tempdir().unwrap();
    let registry = Arc::new(MockRegistry::new().with_package(
        "acme.win",
        "1.0.0",
        PackageArchiveBuilder::new("acme.win", "1.0.0")
            .variant("x86_64-windows-msvc", &["bin/plugin.dll"])
            .build()
            .unwrap(),
    ));

    let err = provisioner(&registry)
        .install(root.path(), &[PackageDescriptor::latest("acme.win")])
        .await
        .unwrap_err();

    assert!(
        err.to_string().contains(&root.path().display().to_string()),
        "error should name the root: {err}"
    );
    match err {
        PlugbayError::IncompatiblePlatform {
            package,
            platform,
            root: failed_root,
            ..
        } => {
            assert_eq!(package, "acme.win@1.0.0");
            assert_eq!(platform, TARGET);
            assert_eq!(failed_root.as_deref(), Some(root.path()));
        }
        other => panic!("expected IncompatiblePlatform, got {other:?}"),
    }
}

#[tokio::test]
async fn package_directory_without_package_toml_is_reinstalled() {
    let root = tempfile::tempdir().unwrap();
    let registry = registry();
    let provisioner = provisioner(&registry);
    let wanted = [PackageDescriptor::exact("acme.greeter", "1.0.0")];

    provisioner.install(root.path(), &wanted).await.unwrap();
    let package_dir = root.path().join("acme.greeter.1.0.0");
    std::fs::remove_file(package_dir.join("package.toml")).unwrap();
    std::fs::write(package_dir.join("stray.txt"), b"left behind").unwrap();

    let report = provisioner.install(root.path(), &wanted).await.unwrap();
    assert_eq!(report.installed().count(), 1);
    assert_eq!(registry.fetch_count(), 2);
    assert!(package_dir.join("package.toml").is_file());
    assert!(!package_dir.join("stray.txt").exists());

    let again = provisioner.install(root.path(), &wanted).await.unwrap();
    assert_eq!(again.reused().count(), 1);
    assert_eq!(registry.fetch_count(), 2);
}

#[tokio::test]
async fn reused_package_restores_missing_installed_record() {
    let root = tempfile::tempdir().unwrap();
    let registry = registry();
    let provisioner = provisioner(&registry);
    let wanted = [PackageDescriptor::exact("acme.greeter", "1.0.0")];
    provisioner.install(root.path(), &wanted).await.unwrap();

    let store = ManifestStore::new(root.path());
    let identity = PackageIdentity::new("acme.greeter", Version::new(1, 0, 0));
    store.record_uninstalled(&identity).unwrap();
    assert!(store.load().unwrap().installed_packages.is_empty());

    let report = provisioner.install(root.path(), &wanted).await.unwrap();
    assert_eq!(report.reused().count(), 1);
    assert_eq!(registry.fetch_count(), 1);

    let installed = store.load().unwrap().installed_packages;
    assert_eq!(
        installed.into_iter().collect::<Vec<_>>(),
        vec![InstalledPackage::from(&identity)]
    );
}

#[tokio::test]
async fn download_failure_is_fatal_and_not_recorded() {
    let root = tempfile::tempdir().unwrap();
    let registry = registry();
    registry.fail_downloads(true);

    let err = provisioner(&registry)
        .install(root.path(), &[PackageDescriptor::latest("acme.greeter")])
        .await
        .unwrap_err();
    assert!(matches!(err, PlugbayError::DownloadFailed { .. }));

    let manifest = ManifestStore::new(root.path()).load().unwrap();
    assert!(manifest.installed_packages.is_empty());
    assert_eq!(manifest.requested_packages.len(), 1);
}

#[tokio::test]
async fn invalid_version_is_config_error_before_any_io() {
    let root = tempfile::tempdir().unwrap();
    let registry = registry();
    let err = provisioner(&registry)
        .install(root.path(), &[PackageDescriptor::exact("acme.greeter", "latest")])
        .await
        .unwrap_err();
    assert!(matches!(err, PlugbayError::Config(_)));
    assert_eq!(registry.find_count(), 0);
    assert!(!ManifestStore::new(root.path()).path().exists());
}

#[tokio::test]
async fn corrupt_manifest_aborts_without_reset() {
    let root = tempfile::tempdir().unwrap();
    let registry = registry();
    let store = ManifestStore::new(root.path());
    std::fs::write(store.path(), "[]garbage").unwrap();

    let err = provisioner(&registry)
        .install(root.path(), &[PackageDescriptor::latest("acme.greeter")])
        .await
        .unwrap_err();
    assert!(matches!(err, PlugbayError::ManifestCorrupt { .. }));
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "[]garbage");
}

#[tokio::test]
async fn cancelled_provisioner_stops_before_first_package() {
    let root = tempfile::tempdir().unwrap();
    let registry = registry();
    let provisioner = provisioner(&registry);
    provisioner.cancellation_token().cancel();

    let err = provisioner
        .install(root.path(), &[PackageDescriptor::latest("acme.greeter")])
        .await
        .unwrap_err();
    assert!(matches!(err, PlugbayError::Cancelled(_)));
    assert_eq!(registry.find_count(), 0);
}

#[tokio::test]
async fn concurrent_installs_on_one_root_download_once() {
    let root = tempfile::tempdir().unwrap();
    let registry = registry();
    let provisioner = Arc::new(provisioner(&registry));
    let wanted = vec![PackageDescriptor::latest("acme.greeter")];

    let (a, b) = tokio::join!(
        provisioner.install(root.path(), &wanted),
        provisioner.install(root.path(), &wanted)
    );
    a.unwrap();
    b.unwrap();
    assert_eq!(registry.fetch_count(), 1);
}

#[tokio::test]
async fn uninstall_removes_directory_and_record() {
    let root = tempfile::tempdir().unwrap();
    let registry = registry();
    let provisioner = provisioner(&registry);
    provisioner
        .install(root.path(), &[PackageDescriptor::exact("acme.greeter", "1.0.0")])
        .await
        .unwrap();

    let identity = PackageIdentity::new("acme.greeter", Version::new(1, 0, 0));
    assert!(provisioner.uninstall(root.path(), &identity).await.unwrap());
    assert!(!root.path().join("acme.greeter.1.0.0").exists());

    let manifest = ManifestStore::new(root.path()).load().unwrap();
    assert!(manifest.installed_packages.is_empty());

    assert!(!provisioner.uninstall(root.path(), &identity).await.unwrap());
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl InstallObserver for RecordingObserver {
    fn on_installed(&self, _root: &Path, identity: &PackageIdentity) -> Result<(), PlugbayError> {
        self.events.lock().unwrap().push(format!("+{identity}"));
        Ok(())
    }

    fn on_uninstalled(
        &self,
        _root: &Path,
        identity: &PackageIdentity,
    ) -> Result<(), PlugbayError> {
        self.events.lock().unwrap().push(format!("-{identity}"));
        Ok(())
    }
}

#[tokio::test]
async fn observers_see_installs_and_uninstalls() {
    let root = tempfile::tempdir().unwrap();
    let registry = registry();
    let observer = Arc::new(RecordingObserver::default());
    let provisioner = provisioner(&registry).with_observer(observer.clone());

    provisioner
        .install(root.path(), &[PackageDescriptor::exact("acme.math", "0.23.0")])
        .await
        .unwrap();
    provisioner
        .uninstall(
            root.path(),
            &PackageIdentity::new("acme.math", Version::new(0, 23, 0)),
        )
        .await
        .unwrap();

    assert_eq!(
        *observer.events.lock().unwrap(),
        vec!["+acme.math@0.23.0", "-acme.math@0.23.0"]
    );

    // The manifest recorder runs alongside custom observers.
    let manifest = ManifestStore::new(root.path()).load().unwrap();
    assert!(manifest.installed_packages.is_empty());
}
