// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability composition for Plugbay.
//!
//! Modules declare named, typed capability bindings through [`Exports`].
//! A [`ContainerBuilder`] gathers modules from in-process sources and from
//! provisioned binaries (via a [`ModuleScanner`]) and builds an immutable
//! [`CapabilityRegistry`] that resolves `(name, interface)` pairs.

pub mod builder;
pub mod exports;
pub mod registry;
pub mod scanner;

pub use builder::ContainerBuilder;
pub use exports::{Binding, Exports, Module, Sharing};
pub use registry::{BindingInfo, CapabilityRegistry};
pub use scanner::{ModuleScanner, ModuleSource, RegistrationTable};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CapabilityRegistry>();
        assert_send_sync::<ContainerBuilder>();
    }
}
