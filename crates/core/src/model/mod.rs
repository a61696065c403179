//! Shared vocabulary for platforms and the fixed names used by the Pebble SDK.
//!
//! Every hardware target ("platform") ships its own import library and its own
//! app binary inside a `.pbw` package, so most of the pipeline is keyed by a
//! platform name.

use std::cmp::Ordering;

/// Platforms known to the SDK, in the order reports list them.
pub const KNOWN_PLATFORMS: [&str; 4] = ["aplite", "basalt", "diorite", "chalk"];

/// Platform assumed for a package member that has no directory prefix.
///
/// Packages built before multi-platform support keep the binary at the root.
pub const DEFAULT_PLATFORM: &str = "aplite";

/// File name of the compiled app inside a `.pbw` package.
pub const APP_BINARY_NAME: &str = "pebble-app.bin";

/// File name of the import library inside `<sdk-core>/pebble/<platform>/lib`.
pub const LIBRARY_FILE_NAME: &str = "libpebble.a";

/// Position of `platform` in [`KNOWN_PLATFORMS`], if it is one of them.
pub fn platform_rank(platform: &str) -> Option<usize> {
    KNOWN_PLATFORMS.iter().position(|p| *p == platform)
}

/// Deterministic platform ordering: known platforms first, in SDK order,
/// everything else afterwards alphabetically.
pub fn compare_platforms(a: &str, b: &str) -> Ordering {
    match (platform_rank(a), platform_rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}
