// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The read-only capability registry produced by [`crate::ContainerBuilder`].

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use plugbay_core::PlugbayError;

use crate::exports::Binding;

/// Summary of one binding, for listings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BindingInfo {
    pub name: String,
    pub interface: String,
    pub contributor: String,
    pub sharing: String,
}

impl From<&Binding> for BindingInfo {
    fn from(binding: &Binding) -> Self {
        Self {
            name: binding.name().to_string(),
            interface: binding.interface().to_string(),
            contributor: binding.contributor().to_string(),
            sharing: binding.sharing().to_string(),
        }
    }
}

/// Immutable name-and-interface lookup over every loaded binding.
///
/// `(name, interface)` pairs are expected to be unique. A pair bound more
/// than once stays in the registry and fails at lookup with
/// [`PlugbayError::AmbiguousCapability`].
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    bindings: HashMap<(String, TypeId), Vec<Binding>>,
}

impl CapabilityRegistry {
    pub(crate) fn from_bindings(all: Vec<Binding>) -> Self {
        let mut bindings: HashMap<(String, TypeId), Vec<Binding>> = HashMap::new();
        for binding in all {
            bindings.entry(binding.key()).or_default().push(binding);
        }
        Self { bindings }
    }

    /// Resolves the capability bound to `name` with interface `T`.
    pub fn resolve<T>(&self, name: &str) -> Result<Arc<T>, PlugbayError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = (name.to_string(), TypeId::of::<Arc<T>>());
        let binding = match self.bindings.get(&key).map(Vec::as_slice) {
            None | Some([]) => {
                return Err(PlugbayError::CapabilityNotFound {
                    name: name.to_string(),
                    interface: type_name::<T>().to_string(),
                });
            }
            Some([binding]) => binding,
            Some(many) => {
                return Err(PlugbayError::AmbiguousCapability {
                    name: name.to_string(),
                    interface: type_name::<T>().to_string(),
                    contributors: many.iter().map(|b| b.contributor().to_string()).collect(),
                });
            }
        };

        binding.instance::<T>().ok_or_else(|| {
            PlugbayError::Internal(format!(
                "binding '{name}' does not produce {}",
                type_name::<T>()
            ))
        })
    }

    /// Resolves the capability exported under the type name of `T`.
    pub fn resolve_default<T>(&self) -> Result<Arc<T>, PlugbayError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve::<T>(type_name::<T>())
    }

    /// True when exactly one binding serves `(name, T)`.
    pub fn contains<T>(&self, name: &str) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.bindings
            .get(&(name.to_string(), TypeId::of::<Arc<T>>()))
            .is_some_and(|b| b.len() == 1)
    }

    /// Every binding, sorted by name, interface, then contributor.
    pub fn bindings(&self) -> Vec<BindingInfo> {
        let mut all: Vec<BindingInfo> = self
            .bindings
            .values()
            .flatten()
            .map(BindingInfo::from)
            .collect();
        all.sort();
        all
    }

    /// Groups of bindings that collide on `(name, interface)`.
    pub fn ambiguities(&self) -> Vec<Vec<BindingInfo>> {
        let mut groups: Vec<Vec<BindingInfo>> = self
            .bindings
            .values()
            .filter(|b| b.len() > 1)
            .map(|b| {
                let mut group: Vec<BindingInfo> = b.iter().map(BindingInfo::from).collect();
                group.sort();
                group
            })
            .collect();
        groups.sort();
        groups
    }

    /// Number of distinct `(name, interface)` pairs.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
