// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Module sources and the discovery of modules behind binary paths.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use plugbay_core::PlugbayError;

use crate::exports::Module;

/// Something the container builder can load capabilities from.
#[derive(Clone)]
pub enum ModuleSource {
    /// An extracted binary, mapped to a module by the builder's scanner.
    Path(PathBuf),
    /// A module living in the current process.
    Module(Arc<dyn Module>),
}

impl fmt::Debug for ModuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ModuleSource::Module(module) => f.debug_tuple("Module").field(&module.name()).finish(),
        }
    }
}

impl From<PathBuf> for ModuleSource {
    fn from(path: PathBuf) -> Self {
        ModuleSource::Path(path)
    }
}

impl From<&Path> for ModuleSource {
    fn from(path: &Path) -> Self {
        ModuleSource::Path(path.to_path_buf())
    }
}

impl From<Arc<dyn Module>> for ModuleSource {
    fn from(module: Arc<dyn Module>) -> Self {
        ModuleSource::Module(module)
    }
}

/// Maps a binary on disk to the module that declares its capabilities.
pub trait ModuleScanner: Send + Sync {
    /// Returns the module for `path`, or `None` when the file declares no
    /// capabilities known to this scanner.
    fn scan(&self, path: &Path) -> Result<Option<Arc<dyn Module>>, PlugbayError>;
}

/// Scanner backed by an explicit table of modules keyed by binary name.
///
/// The key of a binary is its file name up to the first `.`, so
/// `lib/x64/greeter.so` and `lib/any/greeter.wasm` both map to `greeter`.
/// A leading `lib` is also tried stripped, so `libgreeter.so` maps to
/// `greeter` when no `libgreeter` entry exists.
#[derive(Clone, Default)]
pub struct RegistrationTable {
    modules: HashMap<String, Arc<dyn Module>>,
}

impl RegistrationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `module` for binaries named `key`.
    pub fn register(&mut self, key: &str, module: Arc<dyn Module>) -> &mut Self {
        self.modules.insert(key.to_lowercase(), module);
        self
    }

    pub fn with(mut self, key: &str, module: Arc<dyn Module>) -> Self {
        self.register(key, module);
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn lookup(&self, path: &Path) -> Option<Arc<dyn Module>> {
        let file_name = path.file_name()?.to_string_lossy().to_lowercase();
        let key = file_name.split('.').next()?;
        self.modules
            .get(key)
            .or_else(|| {
                key.strip_prefix("lib")
                    .filter(|k| !k.is_empty())
                    .and_then(|k| self.modules.get(k))
            })
            .cloned()
    }
}

impl fmt::Debug for RegistrationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.modules.keys().collect();
        keys.sort();
        f.debug_struct("RegistrationTable").field("keys", &keys).finish()
    }
}

impl ModuleScanner for RegistrationTable {
    fn scan(&self, path: &Path) -> Result<Option<Arc<dyn Module>>, PlugbayError> {
        if !path.is_file() {
            return Err(PlugbayError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "module binary does not exist",
                ),
            });
        }
        Ok(self.lookup(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exports::Exports;

    struct Named(&'static str);

    impl Module for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn register(&self, _exports: &mut Exports) {}
    }

    fn table() -> RegistrationTable {
        RegistrationTable::new()
            .with("greeter", Arc::new(Named("greeter")))
            .with("libmath", Arc::new(Named("math")))
    }

    #[test]
    fn keys_by_name_before_first_dot() {
        let table = table();
        for path in ["lib/x64/greeter.so", "any/Greeter.wasm", "libgreeter.so.1"] {
            let module = table.lookup(Path::new(path)).unwrap();
            assert_eq!(module.name(), "greeter", "{path}");
        }
        assert_eq!(table.lookup(Path::new("libmath.so")).unwrap().name(), "math");
        assert!(table.lookup(Path::new("unknown.so")).is_none());
        assert!(table.lookup(Path::new("lib.so")).is_none());
    }

    #[test]
    fn scan_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("greeter.so");
        std::fs::write(&present, b"bin").unwrap();

        let table = table();
        assert!(table.scan(&present).unwrap().is_some());
        assert!(matches!(
            table.scan(&dir.path().join("missing.so")),
            Err(PlugbayError::Io { .. })
        ));
    }
}
