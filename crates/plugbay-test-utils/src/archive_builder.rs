// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory builder for package archives (tar.gz with a `package.toml`).

use flate2::Compression;
use flate2::write::GzEncoder;

/// Builds package archives for tests.
///
/// Every item named by a variant gets a small placeholder file unless an
/// explicit file with the same path was added.
#[derive(Debug, Clone, Default)]
pub struct PackageArchiveBuilder {
    package: Option<(String, String)>,
    description: Option<String>,
    variants: Vec<(String, Vec<String>)>,
    files: Vec<(String, Vec<u8>)>,
    raw: Vec<(String, Vec<u8>)>,
}

impl PackageArchiveBuilder {
    /// Archive for `id` at `version`, with a generated `package.toml`.
    pub fn new(id: &str, version: &str) -> Self {
        Self {
            package: Some((id.to_string(), version.to_string())),
            ..Self::default()
        }
    }

    /// Archive without any `package.toml`.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Declares a variant group and its items, in order.
    pub fn variant(mut self, platform: &str, items: &[&str]) -> Self {
        self.variants.push((
            platform.to_string(),
            items.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Adds a regular file.
    pub fn file(mut self, path: &str, contents: &[u8]) -> Self {
        self.files.push((path.to_string(), contents.to_vec()));
        self
    }

    /// Adds an entry whose name is written verbatim into the tar header,
    /// bypassing the path checks `tar::Builder` performs.
    pub fn raw_entry(mut self, path: &str, contents: &[u8]) -> Self {
        self.raw.push((path.to_string(), contents.to_vec()));
        self
    }

    /// The generated `package.toml`, if this archive has one.
    pub fn package_toml(&self) -> Option<String> {
        let (id, version) = self.package.as_ref()?;
        let mut out = format!("[package]\nid = \"{id}\"\nversion = \"{version}\"\n");
        if let Some(description) = &self.description {
            out.push_str(&format!("description = \"{description}\"\n"));
        }
        for (platform, items) in &self.variants {
            let items: Vec<String> = items.iter().map(|i| format!("\"{i}\"")).collect();
            out.push_str(&format!(
                "\n[[variants]]\nplatform = \"{platform}\"\nitems = [{}]\n",
                items.join(", ")
            ));
        }
        Some(out)
    }

    /// Produces the gzip-compressed tarball.
    pub fn build(&self) -> std::io::Result<Vec<u8>> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut tar = tar::Builder::new(encoder);

        if let Some(manifest) = self.package_toml() {
            append(&mut tar, "package.toml", manifest.as_bytes())?;
        }
        for (path, contents) in &self.files {
            append(&mut tar, path, contents)?;
        }
        for (platform, items) in &self.variants {
            for item in items {
                if self.files.iter().any(|(p, _)| p == item) {
                    continue;
                }
                append(&mut tar, item, format!("{platform}:{item}").as_bytes())?;
            }
        }
        for (path, contents) in &self.raw {
            append_raw(&mut tar, path, contents)?;
        }

        tar.into_inner()?.finish()
    }
}

type ArchiveWriter = tar::Builder<GzEncoder<Vec<u8>>>;

fn append(tar: &mut ArchiveWriter, path: &str, contents: &[u8]) -> std::io::Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(contents.len() as u64);
    header.set_mode(0o644);
    header.set_entry_type(tar::EntryType::Regular);
    tar.append_data(&mut header, path, contents)
}

fn append_raw(tar: &mut ArchiveWriter, path: &str, contents: &[u8]) -> std::io::Result<()> {
    let mut header = tar::Header::new_gnu();
    let name = path.as_bytes();
    header.as_mut_bytes()[..name.len()].copy_from_slice(name);
    header.set_size(contents.len() as u64);
    header.set_mode(0o644);
    header.set_entry_type(tar::EntryType::Regular);
    header.set_cksum();
    tar.append(&header, contents)
}
