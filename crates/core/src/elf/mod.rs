//! Structural access to relocatable object files.
//!
//! The catalog builder only needs two things from an object: its sections in
//! file order, and the relocation entries that apply to a given section. The
//! [`ObjectFile`] trait captures exactly that so the builder can be driven by
//! the goblin-backed [`ElfObject`] in production and by in-memory fakes in tests.

use std::collections::HashMap;

use goblin::elf::section_header::{SHT_NOBITS, SHT_REL, SHT_RELA};
use goblin::elf::Elf;
use thiserror::Error;

/// Error type for object decoding.
#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("Failed to parse ELF object: {0}")]
    Parse(#[from] goblin::error::Error),

    #[error("Section `{name}` ({size} bytes at offset {offset}) lies outside the object")]
    SectionOutOfBounds { name: String, offset: u64, size: u64 },
}

/// A named section and its raw bytes, borrowed from the object buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'data> {
    pub name: &'data str,
    pub data: &'data [u8],
}

/// One relocation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelocationEntry {
    /// Byte offset inside the relocated section.
    pub offset: u64,
    /// Index of the referenced symbol.
    pub symbol: usize,
    /// Architecture-specific relocation type.
    pub kind: u32,
    /// Explicit addend (RELA only).
    pub addend: Option<i64>,
}

/// Read-only structural view of an object file.
pub trait ObjectFile<'data> {
    /// All sections, in the object's own order.
    fn sections(&self) -> Vec<Section<'data>>;

    /// Relocation entries of the section named `relocation_section`
    /// (e.g. `.rel.text.foo`), or `None` if no such section exists.
    fn relocations(&self, relocation_section: &str) -> Option<&[RelocationEntry]>;
}

/// ELF object parsed with goblin.
#[derive(Debug)]
pub struct ElfObject<'data> {
    sections: Vec<Section<'data>>,
    relocations: HashMap<&'data str, Vec<RelocationEntry>>,
}

impl<'data> ElfObject<'data> {
    /// Parse `bytes` as a 32- or 64-bit ELF object of either endianness.
    pub fn parse(bytes: &'data [u8]) -> Result<Self, ObjectError> {
        let elf = Elf::parse(bytes)?;

        let mut sections = Vec::with_capacity(elf.section_headers.len());
        for sh in &elf.section_headers {
            let name = elf.shdr_strtab.get_at(sh.sh_name).unwrap_or("");
            let data = if sh.sh_type == SHT_NOBITS || sh.sh_size == 0 {
                &[][..]
            } else {
                section_bytes(bytes, sh.sh_offset, sh.sh_size).ok_or_else(|| {
                    ObjectError::SectionOutOfBounds {
                        name: name.to_string(),
                        offset: sh.sh_offset,
                        size: sh.sh_size,
                    }
                })?
            };
            sections.push(Section { name, data });
        }

        let mut relocations = HashMap::new();
        for (index, relocs) in &elf.shdr_relocs {
            let Some(sh) = elf.section_headers.get(*index) else { continue };
            if sh.sh_type != SHT_REL && sh.sh_type != SHT_RELA {
                continue;
            }
            let name = elf.shdr_strtab.get_at(sh.sh_name).unwrap_or("");
            let entries = relocs
                .iter()
                .map(|r| RelocationEntry {
                    offset: r.r_offset,
                    symbol: r.r_sym,
                    kind: r.r_type,
                    addend: r.r_addend,
                })
                .collect();
            relocations.insert(name, entries);
        }

        log::trace!(
            "Parsed ELF object: {} sections, {} relocation sections",
            sections.len(),
            relocations.len()
        );
        Ok(Self { sections, relocations })
    }
}

impl<'data> ObjectFile<'data> for ElfObject<'data> {
    fn sections(&self) -> Vec<Section<'data>> {
        self.sections.clone()
    }

    fn relocations(&self, relocation_section: &str) -> Option<&[RelocationEntry]> {
        self.relocations.get(relocation_section).map(Vec::as_slice)
    }
}

fn section_bytes(bytes: &[u8], offset: u64, size: u64) -> Option<&[u8]> {
    let start = usize::try_from(offset).ok()?;
    let end = start.checked_add(usize::try_from(size).ok()?)?;
    bytes.get(start..end)
}
