//! Version arithmetic for release and development iterations.

/// Suffix marking a development (unreleased) version.
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Returns the release version for a development version.
///
/// `1.0-SNAPSHOT` becomes `1.0`; versions without the snapshot suffix are
/// returned unchanged.
#[must_use]
pub fn release_version_of(version: &str) -> String {
    version
        .strip_suffix(SNAPSHOT_SUFFIX)
        .unwrap_or(version)
        .to_owned()
}

/// Returns the next development version after a release.
///
/// The last numeric segment is incremented: `1.0` becomes `1.1-SNAPSHOT` and
/// `2.0.9` becomes `2.0.10-SNAPSHOT`. A release whose last segment is not
/// numeric gets `.1` appended.
#[must_use]
pub fn next_development_version(release_version: &str) -> String {
    let base = release_version_of(release_version);
    let next = match base.rsplit_once('.') {
        Some((head, last)) => match last.parse::<u64>() {
            Ok(number) => format!("{head}.{}", number.saturating_add(1)),
            Err(_) => format!("{base}.1"),
        },
        None => match base.parse::<u64>() {
            Ok(number) => number.saturating_add(1).to_string(),
            Err(_) => format!("{base}.1"),
        },
    };
    format!("{next}{SNAPSHOT_SUFFIX}")
}

/// Returns `true` when the version carries the snapshot suffix.
#[must_use]
pub fn is_snapshot(version: &str) -> bool {
    version.ends_with(SNAPSHOT_SUFFIX)
}
