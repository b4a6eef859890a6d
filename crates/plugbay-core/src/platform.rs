// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform tokens and the compatibility relation between them.
//!
//! A token is a dash-separated list of lower-case components such as
//! `x86_64-linux-gnu`, `linux`, or `x86_64`. The special token `any` has no
//! components and applies everywhere. A variant built for platform `P` can
//! run on target `T` when every component of `P` appears in `T`, in order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlugbayError;

const ANY: &str = "any";

/// A parsed platform token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Platform {
    components: Vec<String>,
}

/// How well a variant platform fits a target. Higher ranks win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Compatibility {
    exact: bool,
    specificity: usize,
}

impl Compatibility {
    pub fn is_exact(&self) -> bool {
        self.exact
    }

    /// Number of platform components the variant pinned down.
    pub fn specificity(&self) -> usize {
        self.specificity
    }
}

impl Platform {
    /// The platform that applies everywhere.
    pub fn any() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// The platform this binary was compiled for, as `<arch>-<os>[-<env>]`.
    pub fn host() -> Self {
        let mut components = vec![
            std::env::consts::ARCH.to_string(),
            std::env::consts::OS.to_string(),
        ];
        if let Some(env) = host_env() {
            components.push(env.to_string());
        }
        Self { components }
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn is_any(&self) -> bool {
        self.components.is_empty()
    }

    /// Ranks this variant platform against `target`, or `None` when a
    /// variant built for `self` cannot run on `target`.
    pub fn compatibility_with(&self, target: &Platform) -> Option<Compatibility> {
        let exact = self.components == target.components;
        if !exact && !is_subsequence(&self.components, &target.components) {
            return None;
        }
        Some(Compatibility {
            exact,
            specificity: self.components.len(),
        })
    }
}

fn is_subsequence(needle: &[String], haystack: &[String]) -> bool {
    let mut rest = haystack.iter();
    needle.iter().all(|c| rest.any(|h| h == c))
}

fn host_env() -> Option<&'static str> {
    if cfg!(target_env = "gnu") {
        Some("gnu")
    } else if cfg!(target_env = "musl") {
        Some("musl")
    } else if cfg!(target_env = "msvc") {
        Some("msvc")
    } else {
        None
    }
}

impl FromStr for Platform {
    type Err = PlugbayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();
        if token.is_empty() {
            return Err(PlugbayError::Config(
                "platform token must not be empty".to_string(),
            ));
        }
        if token == ANY {
            return Ok(Self::any());
        }
        let components: Vec<String> = token.split('-').map(str::to_string).collect();
        if components.iter().any(|c| c.is_empty()) {
            return Err(PlugbayError::Config(format!(
                "platform token '{s}' has an empty component"
            )));
        }
        if components.iter().any(|c| c == ANY) {
            return Err(PlugbayError::Config(format!(
                "platform token '{s}' may only use 'any' on its own"
            )));
        }
        Ok(Self { components })
    }
}

impl TryFrom<String> for Platform {
    type Error = PlugbayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Platform> for String {
    fn from(p: Platform) -> Self {
        p.to_string()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            f.write_str(ANY)
        } else {
            f.write_str(&self.components.join("-"))
        }
    }
}
