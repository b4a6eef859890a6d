// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability bindings declared by modules.
//!
//! A module declares what it provides by calling [`Exports::export`] from its
//! [`Module::register`] implementation. Each binding pairs a name with an
//! interface type (usually a trait object such as `dyn Greeter`) and a
//! factory producing `Arc<T>`.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::{Arc, OnceLock};

type Instance = Box<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn() -> Instance + Send + Sync>;

/// Whether a binding hands out one cached instance or a fresh one per lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Sharing {
    /// Created on first resolve and cached for the registry's lifetime.
    #[default]
    Shared,
    /// Created anew on every resolve.
    NonShared,
}

impl fmt::Display for Sharing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sharing::Shared => write!(f, "shared"),
            Sharing::NonShared => write!(f, "non-shared"),
        }
    }
}

/// A loadable unit of capabilities.
///
/// In-process modules implement this directly. Binary modules on disk are
/// mapped to an implementation by a [`crate::ModuleScanner`].
pub trait Module: Send + Sync {
    /// Name reported as the contributor of this module's bindings.
    fn name(&self) -> &str;

    /// Declares the module's capability bindings.
    fn register(&self, exports: &mut Exports);
}

/// One `(name, interface)` binding contributed by a module.
pub struct Binding {
    name: String,
    interface: &'static str,
    type_id: TypeId,
    sharing: Sharing,
    contributor: String,
    factory: Factory,
    cache: OnceLock<Instance>,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.name)
            .field("interface", &self.interface)
            .field("sharing", &self.sharing)
            .field("contributor", &self.contributor)
            .finish()
    }
}

impl Binding {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name of the bound interface.
    pub fn interface(&self) -> &'static str {
        self.interface
    }

    pub fn sharing(&self) -> Sharing {
        self.sharing
    }

    /// Module that declared the binding.
    pub fn contributor(&self) -> &str {
        &self.contributor
    }

    pub(crate) fn key(&self) -> (String, TypeId) {
        (self.name.clone(), self.type_id)
    }

    /// Produces the bound instance, honoring the sharing policy.
    ///
    /// Returns `None` if `T` is not the bound interface.
    pub(crate) fn instance<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match self.sharing {
            Sharing::Shared => self
                .cache
                .get_or_init(|| (self.factory)())
                .downcast_ref::<Arc<T>>()
                .cloned(),
            Sharing::NonShared => (self.factory)().downcast::<Arc<T>>().ok().map(|b| *b),
        }
    }
}

/// Collects the bindings a module declares.
pub struct Exports {
    contributor: String,
    bindings: Vec<Binding>,
}

impl Exports {
    pub(crate) fn new(contributor: impl Into<String>) -> Self {
        Self {
            contributor: contributor.into(),
            bindings: Vec::new(),
        }
    }

    /// Binds `name` to interface `T`.
    pub fn export<T, F>(&mut self, name: &str, sharing: Sharing, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.bindings.push(Binding {
            name: name.to_string(),
            interface: type_name::<T>(),
            type_id: TypeId::of::<Arc<T>>(),
            sharing,
            contributor: self.contributor.clone(),
            factory: Arc::new(move || Box::new(factory()) as Instance),
            cache: OnceLock::new(),
        });
        self
    }

    /// Binds interface `T` under its type name, for lookups without a name.
    pub fn export_default<T, F>(&mut self, sharing: Sharing, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.export::<T, F>(type_name::<T>(), sharing, factory)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub(crate) fn into_bindings(self) -> Vec<Binding> {
        self.bindings
    }
}
