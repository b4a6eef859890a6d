// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the provisioning pipeline and its collaborators.

pub mod observer;
pub mod registry;

pub use observer::InstallObserver;
pub use registry::{ArchiveStream, RegistryClient};
