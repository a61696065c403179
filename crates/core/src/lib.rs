//! pbw-api-core
//!
//! Core library for finding which Pebble SDK API functions a compiled watch app
//! references.
//!
//! The SDK import library (`libpebble.a`) holds one code stub per exported
//! function. Apps linked against the SDK carry byte-identical copies of the stubs
//! they call, give or take one relocated word, so scanning an app binary for
//! those stubs recovers its API usage without any disassembly.
//!
//! Pipeline: [`archive`] decodes the import library, [`elf`] exposes its object
//! member, [`catalog`] turns the per-function sections into signatures, and
//! [`scan`] matches them against a binary pulled out of a [`package`].
//! [`services::analysis`] runs all of it per platform.

pub mod archive;
pub mod catalog;
pub mod config;
pub mod elf;
pub mod model;
pub mod package;
pub mod report;
pub mod scan;
pub mod services;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
