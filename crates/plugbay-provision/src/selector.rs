// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Picks the variant group that best fits a target platform.

use plugbay_core::{Compatibility, Platform, PlugbayError, VariantGroup};

/// Selects the nearest compatible variant group for `target`.
///
/// An exact platform match wins outright. Otherwise the group naming the
/// most components wins, and among equals the first declared group is kept.
/// Groups whose token does not parse are never compatible.
pub fn select<'a>(
    package: &str,
    groups: &'a [VariantGroup],
    target: &Platform,
) -> Result<&'a VariantGroup, PlugbayError> {
    let mut best: Option<(Compatibility, &VariantGroup)> = None;

    for group in groups {
        let Some(rank) = group
            .platform
            .parse::<Platform>()
            .ok()
            .and_then(|p| p.compatibility_with(target))
        else {
            continue;
        };
        if best.as_ref().is_none_or(|(current, _)| rank > *current) {
            best = Some((rank, group));
        }
    }

    best.map(|(_, group)| group)
        .ok_or_else(|| PlugbayError::IncompatiblePlatform {
            package: package.to_string(),
            platform: target.to_string(),
            available: groups.iter().map(|g| g.platform.clone()).collect(),
            root: None,
        })
}
