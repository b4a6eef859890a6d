// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Plugbay integration tests.
//!
//! # Components
//!
//! - [`MockRegistry`] - In-memory registry client with call counters and failure injection
//! - [`PackageArchiveBuilder`] - Builds tar.gz package archives in memory

pub mod archive_builder;
pub mod mock_registry;

pub use archive_builder::PackageArchiveBuilder;
pub use mock_registry::MockRegistry;
