// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests: provision from a registry, then compose capabilities
//! from the selected binaries.

use std::path::Path;
use std::sync::Arc;

use plugbay::{
    Exports, Module, PackageDescriptor, Platform, PlugbayConfig, PlugbayError, Provisioner,
    RegistrationTable, Sharing,
};
use plugbay_test_utils::{MockRegistry, PackageArchiveBuilder};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

trait Greeter: Send + Sync {
    fn greet(&self, who: &str) -> String;
}

struct Hello;

impl Greeter for Hello {
    fn greet(&self, who: &str) -> String {
        format!("hello {who}")
    }
}

struct GreeterModule;

impl Module for GreeterModule {
    fn name(&self) -> &str {
        "greeter"
    }

    fn register(&self, exports: &mut Exports) {
        exports.export::<dyn Greeter, _>("toto", Sharing::Shared, || Arc::new(Hello));
    }
}

fn greeter_archive(version: &str) -> Vec<u8> {
    PackageArchiveBuilder::new("acme.greeter", version)
        .variant("aarch64-linux-gnu", &["lib/arm64/greeter.so"])
        .variant("x86_64-linux-gnu", &["lib/x64/greeter.so"])
        .build()
        .unwrap()
}

fn config(source: &str, root: &Path) -> PlugbayConfig {
    let toml = format!(
        r#"
[registry]
source = '{source}'

[install]
root = '{}'
target_platform = "x86_64-linux-gnu"
"#,
        root.display()
    );
    plugbay::load_and_validate_str(&toml).unwrap()
}

fn table() -> Arc<RegistrationTable> {
    Arc::new(RegistrationTable::new().with("greeter", Arc::new(GreeterModule)))
}

#[tokio::test]
async fn folder_registry_install_composes_capabilities() {
    let feed = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    std::fs::write(
        feed.path().join("acme.greeter.1.0.0.tar.gz"),
        greeter_archive("1.0.0"),
    )
    .unwrap();
    std::fs::write(
        feed.path().join("acme.greeter.1.1.0.tar.gz"),
        greeter_archive("1.1.0"),
    )
    .unwrap();

    let config = config(&feed.path().display().to_string(), root.path());
    let builder = plugbay::install(
        &config,
        &[PackageDescriptor::latest("acme.greeter")],
        root.path(),
    )
    .await
    .unwrap();

    let expected = root.path().join("acme.greeter.1.1.0/lib/x64/greeter.so");
    assert_eq!(builder.sources().len(), 1);
    assert!(expected.is_file());

    let registry = builder.with_scanner(table()).build().unwrap();
    let greeter = registry.resolve::<dyn Greeter>("toto").unwrap();
    assert_eq!(greeter.greet("ada"), "hello ada");
    assert!(
        registry.bindings()[0]
            .contributor
            .ends_with(&format!("({})", expected.display()))
    );
}

#[tokio::test]
async fn repeated_provisioning_reuses_installed_packages() {
    let root = tempfile::tempdir().unwrap();
    let registry = Arc::new(MockRegistry::new().with_package(
        "acme.greeter",
        "1.0.0",
        greeter_archive("1.0.0"),
    ));
    let provisioner = Provisioner::new(registry.clone())
        .with_target("x86_64-linux-gnu".parse::<Platform>().unwrap());
    let wanted = [PackageDescriptor::exact("acme.greeter", "1.0.0")];

    let (first, _) = plugbay::provision(&provisioner, root.path(), &wanted)
        .await
        .unwrap();
    let (second, builder) = plugbay::provision(&provisioner, root.path(), &wanted)
        .await
        .unwrap();

    assert_eq!(first.installed().count(), 1);
    assert_eq!(second.reused().count(), 1);
    assert_eq!(registry.fetch_count(), 1);

    let registry = builder.with_scanner(table()).build_strict().unwrap();
    assert!(registry.contains::<dyn Greeter>("toto"));
}

#[tokio::test]
async fn http_registry_install_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/acme.greeter/index.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"versions":["0.9.0","1.0.0","2.0.0-rc.1"]}"#),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/acme.greeter/1.0.0/acme.greeter.1.0.0.tar.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(greeter_archive("1.0.0")))
        .expect(1)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let config = config(&format!("{}/v1", server.uri()), root.path());
    let builder = plugbay::install(
        &config,
        &[PackageDescriptor::latest("acme.greeter")],
        root.path(),
    )
    .await
    .unwrap();

    assert!(root.path().join("acme.greeter.1.0.0/package.toml").is_file());
    let registry = builder.with_scanner(table()).build().unwrap();
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn unknown_package_is_skipped_by_default() {
    let feed = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let config = config(&feed.path().display().to_string(), root.path());

    let builder = plugbay::install(
        &config,
        &[PackageDescriptor::latest("acme.missing")],
        root.path(),
    )
    .await
    .unwrap();
    assert!(builder.sources().is_empty());
}

#[tokio::test]
async fn invalid_version_fails_before_touching_the_root() {
    let feed = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let config = config(&feed.path().display().to_string(), root.path());

    let err = plugbay::install(
        &config,
        &[PackageDescriptor::exact("acme.greeter", "not-a-version")],
        root.path(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PlugbayError::Config(_)));
    assert!(!root.path().join("plugbay.json").exists());
}
