//! Signature scanning over app binaries.
//!
//! The scan is exhaustive: every offset after the app header is tested against
//! every signature, and every hit is reported. A signature found at two offsets
//! is reported twice, and two signatures matching at the same offset are both
//! reported, in catalog order.

mod header;

use thiserror::Error;

use crate::catalog::{FunctionSignature, PlatformLibrary};

pub use header::{AppHeader, Version, APP_HEADER_SIZE, APP_MAGIC};

/// Error type for app binaries that cannot be scanned.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("App binary is {len} bytes, shorter than the {}-byte header", APP_HEADER_SIZE)]
    TruncatedHeader { len: usize },
}

/// Indices of every signature occurrence in `code`.
///
/// Results are ordered by offset, then by catalog index. Nothing is deduplicated.
pub fn scan(code: &[u8], functions: &[FunctionSignature<'_>]) -> Vec<usize> {
    let mut used = Vec::new();
    let Some(shortest) = functions.iter().map(FunctionSignature::len).min() else {
        return used;
    };
    if code.len() < shortest {
        return used;
    }

    for start in 0..=code.len() - shortest {
        let window = &code[start..];
        for (index, function) in functions.iter().enumerate() {
            if function.matches(window) {
                used.push(index);
            }
        }
    }
    used
}

/// An app binary extracted for one platform.
#[derive(Debug, Clone)]
pub struct AppBinary {
    platform: String,
    header: AppHeader,
    bytes: Vec<u8>,
    used: Vec<usize>,
}

impl AppBinary {
    /// Take ownership of the binary bytes and decode the header.
    pub fn new(platform: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ScanError> {
        let platform = platform.into();
        let header = AppHeader::parse(&bytes)?;
        if !header.has_valid_magic() {
            log::warn!("App binary for {platform} has unexpected magic {:?}", header.magic);
        }
        Ok(Self { platform, header, bytes, used: Vec::new() })
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn header(&self) -> &AppHeader {
        &self.header
    }

    /// Bytes after the header; the only region that is scanned.
    pub fn code(&self) -> &[u8] {
        &self.bytes[APP_HEADER_SIZE..]
    }

    /// Scan against `library` and return the number of matches.
    ///
    /// Replaces the result of any earlier scan.
    pub fn scan(&mut self, library: &PlatformLibrary<'_>) -> usize {
        self.used = scan(self.code(), library.functions());
        log::info!("Found usage of {} API functions for {}", self.used.len(), self.platform);
        self.used.len()
    }

    /// Catalog indices of the matches, in discovery order.
    pub fn used_functions(&self) -> &[usize] {
        &self.used
    }

    /// Matched function names, with repeats.
    pub fn used_function_names<'a>(
        &'a self,
        library: &'a PlatformLibrary<'a>,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.used.iter().filter_map(|index| library.function(*index)).map(|f| f.name.as_str())
    }
}
