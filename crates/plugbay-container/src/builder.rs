// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregates module sources into a [`CapabilityRegistry`].

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use plugbay_core::PlugbayError;
use tracing::{debug, info, warn};

use crate::exports::{Exports, Module};
use crate::registry::CapabilityRegistry;
use crate::scanner::{ModuleScanner, ModuleSource, RegistrationTable};

/// Collects module sources and builds the capability registry once.
///
/// Sources keep their insertion order, but order never picks a winner:
/// duplicate `(name, interface)` bindings are reported as ambiguous.
pub struct ContainerBuilder {
    sources: Vec<ModuleSource>,
    scanner: Arc<dyn ModuleScanner>,
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("sources", &self.sources)
            .finish()
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBuilder {
    /// Builder whose scanner knows no binaries; path sources contribute nothing
    /// until a scanner is supplied with [`ContainerBuilder::with_scanner`].
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            scanner: Arc::new(RegistrationTable::new()),
        }
    }

    pub fn with_scanner(mut self, scanner: Arc<dyn ModuleScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    /// Appends a module source.
    pub fn add(&mut self, source: impl Into<ModuleSource>) -> &mut Self {
        self.sources.push(source.into());
        self
    }

    /// Appends an in-process module.
    pub fn add_module(&mut self, module: impl Module + 'static) -> &mut Self {
        self.add(Arc::new(module) as Arc<dyn Module>)
    }

    /// Appends every path in `files`, in order.
    pub fn add_files<I>(&mut self, files: I) -> &mut Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        for file in files {
            self.add(file);
        }
        self
    }

    pub fn sources(&self) -> &[ModuleSource] {
        &self.sources
    }

    /// Runs discovery over every source and returns the registry.
    ///
    /// Ambiguous bindings are kept and reported when resolved.
    pub fn build(self) -> Result<CapabilityRegistry, PlugbayError> {
        let registry = self.discover()?;
        for group in registry.ambiguities() {
            if let Some(first) = group.first() {
                warn!(
                    capability = %first.name,
                    interface = %first.interface,
                    contributors = group.len(),
                    "capability bound by more than one module"
                );
            }
        }
        Ok(registry)
    }

    /// Like [`ContainerBuilder::build`], but fails on the first ambiguous binding.
    pub fn build_strict(self) -> Result<CapabilityRegistry, PlugbayError> {
        let registry = self.discover()?;
        if let Some(group) = registry.ambiguities().into_iter().next() {
            let (name, interface) = group
                .first()
                .map(|b| (b.name.clone(), b.interface.clone()))
                .unwrap_or_default();
            return Err(PlugbayError::AmbiguousCapability {
                name,
                interface,
                contributors: group.into_iter().map(|b| b.contributor).collect(),
            });
        }
        Ok(registry)
    }

    fn discover(self) -> Result<CapabilityRegistry, PlugbayError> {
        let mut seen_paths = HashSet::new();
        let mut bindings = Vec::new();
        let mut modules = 0usize;

        for source in &self.sources {
            let (module, contributor) = match source {
                ModuleSource::Module(module) => (module.clone(), module.name().to_string()),
                ModuleSource::Path(path) => {
                    if !seen_paths.insert(path.clone()) {
                        debug!(path = %path.display(), "module already added, skipping");
                        continue;
                    }
                    match self.scanner.scan(path)? {
                        Some(module) => {
                            let contributor = format!("{} ({})", module.name(), path.display());
                            (module, contributor)
                        }
                        None => {
                            debug!(path = %path.display(), "binary declares no capabilities");
                            continue;
                        }
                    }
                }
            };

            let mut exports = Exports::new(contributor);
            module.register(&mut exports);
            debug!(module = %module.name(), bindings = exports.len(), "module registered");
            bindings.extend(exports.into_bindings());
            modules += 1;
        }

        let registry = CapabilityRegistry::from_bindings(bindings);
        info!(
            sources = self.sources.len(),
            modules,
            capabilities = registry.len(),
            "capability registry built"
        );
        Ok(registry)
    }
}
