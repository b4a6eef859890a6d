// SPDX-FileCopyrightText: 2026 Plugbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exact/latest version resolution shared by every registry client.

use semver::Version;

/// Picks a version from `candidates`.
///
/// With `requested` set, only an exact match is accepted and the prerelease
/// flag is ignored. Without it, the highest candidate wins, skipping
/// prereleases unless `allow_prerelease` is true. Returns `None` when nothing
/// qualifies.
pub fn resolve_version<'a, I>(
    candidates: I,
    requested: Option<&Version>,
    allow_prerelease: bool,
) -> Option<Version>
where
    I: IntoIterator<Item = &'a Version>,
{
    let mut candidates = candidates.into_iter();
    match requested {
        Some(wanted) => candidates.find(|v| *v == wanted).cloned(),
        None => candidates
            .filter(|v| allow_prerelease || v.pre.is_empty())
            .max()
            .cloned(),
    }
}

/// Parses registry version strings, dropping entries that are not semver.
pub fn parse_versions<'a, I>(raw: I) -> Vec<Version>
where
    I: IntoIterator<Item = &'a str>,
{
    raw.into_iter()
        .filter_map(|s| Version::parse(s.trim()).ok())
        .collect()
}
