use std::path::Path;

use anyhow::{Context, Result};
use pbw_api_core::archive::Archive;
use serde::Serialize;

use crate::commands::print_json;

/// One archive member as listed by `members`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRow {
    pub index: usize,
    pub name: String,
    pub size: usize,
    pub offset: usize,
}

/// Decode an archive and describe its members in file order.
pub fn archive_members(path: &Path) -> Result<Vec<MemberRow>> {
    let archive = Archive::load(path)
        .with_context(|| format!("Failed to load archive {}", path.display()))?;
    Ok(archive
        .entries()
        .iter()
        .enumerate()
        .map(|(index, entry)| MemberRow {
            index,
            name: entry.name.clone(),
            size: entry.size,
            offset: entry.offset,
        })
        .collect())
}

/// List the members of an `ar` archive.
pub fn members_command(path: &Path, json: bool) -> Result<()> {
    let members = archive_members(path)?;

    if json {
        return print_json(&members);
    }

    println!("Members ({}):", members.len());
    if members.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    for member in members {
        println!(
            "  - [{}] {} ({} bytes at offset {})",
            member.index, member.name, member.size, member.offset
        );
    }
    Ok(())
}
