use std::path::Path;

use anyhow::{Context, Result};
use pbw_api_core::archive::Archive;
use pbw_api_core::catalog::{PlatformLibrary, SkippedFunction};
use pbw_api_core::model::DEFAULT_PLATFORM;
use pbw_api_core::report::{catalog_entries, CatalogEntry};
use serde::Serialize;

use crate::commands::print_json;

/// Catalog of one import library, as printed by `functions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionListing {
    pub platform: String,
    pub functions: Vec<CatalogEntry>,
    pub skipped: Vec<SkippedFunction>,
}

/// Build the function catalog of the import library at `path`.
pub fn library_functions(path: &Path, platform: Option<&str>) -> Result<FunctionListing> {
    let platform = platform.unwrap_or(DEFAULT_PLATFORM);
    let archive = Archive::load(path)
        .with_context(|| format!("Failed to load archive {}", path.display()))?;
    let library = PlatformLibrary::from_archive(platform, &archive)
        .with_context(|| format!("Failed to build function catalog from {}", path.display()))?;
    Ok(FunctionListing {
        platform: library.platform().to_string(),
        functions: catalog_entries(&library),
        skipped: library.skipped().to_vec(),
    })
}

/// List the API functions of an import library.
pub fn functions_command(path: &Path, platform: Option<&str>, json: bool) -> Result<()> {
    let listing = library_functions(path, platform)?;

    if json {
        return print_json(&listing);
    }

    println!("Functions for {} ({}):", listing.platform, listing.functions.len());
    for function in &listing.functions {
        let index = function.symbol_index.map_or_else(|| "-".to_string(), |i| i.to_string());
        let reloc = function.relocation_offset.map_or_else(|| "-".to_string(), |o| o.to_string());
        println!(
            "  - {} (size: {}, symbol index: {}, relocation: {})",
            function.name, function.size, index, reloc
        );
    }
    if !listing.skipped.is_empty() {
        println!("Skipped ({}):", listing.skipped.len());
        for skipped in &listing.skipped {
            println!("  - {}: {}", skipped.name, skipped.reason);
        }
    }
    Ok(())
}
