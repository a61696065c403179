//! Function catalog built from a platform's import library.
//!
//! The SDK import library is an archive holding a symbol table, a string table
//! and one object file. That object carries one `.text.<function>` section per
//! exported API function; the section bytes are the stub the linker copies into
//! every app that calls the function, so they double as a byte signature.
//!
//! A stub may contain one relocated word (the jump into the firmware). Those four
//! bytes differ between builds and are masked out when matching.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::archive::{Archive, ArchiveEntry, STRING_TABLE_NAME, SYMBOL_TABLE_NAME};
use crate::elf::{ElfObject, ObjectError, ObjectFile, Section};

/// Prefix of the per-function code sections.
pub const FUNCTION_SECTION_PREFIX: &str = ".text.";

/// Extension the object member of an import library must carry.
pub const OBJECT_EXTENSION: &str = ".o";

/// The only relocation type a signature may carry (`R_ARM_THM_JUMP24`).
///
/// This is specific to the Thumb-2 stubs of the SDK; other architectures would
/// need a different value.
pub const SUPPORTED_RELOCATION_KIND: u32 = 30;

/// Number of bytes patched by the linker at a relocation offset.
pub const RELOCATION_WINDOW: usize = 4;

/// Size of a stub that loads its target from the firmware jump table.
const JUMP_TABLE_STUB_SIZE: usize = 12;
/// Offset of the jump-table byte offset inside such a stub.
const JUMP_TABLE_OFFSET_POS: usize = 8;

/// Error type for catalog construction.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The library archive does not have the symtab / strtab / object layout.
    #[error("Invalid import library content for {platform}: {reason}")]
    InvalidShape { platform: String, reason: String },

    #[error("Could not load object `{member}` for {platform}: {source}")]
    Object {
        platform: String,
        member: String,
        #[source]
        source: ObjectError,
    },

    #[error("No API functions found for {platform}")]
    NoFunctions { platform: String },
}

/// Byte signature of one API function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature<'data> {
    /// Function name (the section name without [`FUNCTION_SECTION_PREFIX`]).
    pub name: String,
    /// Code bytes, borrowed from the object member they were read from.
    pub code: &'data [u8],
    /// Start of the 4-byte window ignored when matching.
    pub relocation_offset: Option<usize>,
    /// Index into the firmware jump table. Only set for 12-byte stubs; used to
    /// correlate one function across platforms, never for matching.
    pub symbol_table_index: Option<u32>,
}

impl<'data> FunctionSignature<'data> {
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Whether `window` starts with this signature, ignoring the relocation window.
    ///
    /// Returns `false` when `window` is shorter than the signature, or when the
    /// relocation window does not fit inside the code. An empty signature matches
    /// any window.
    pub fn matches(&self, window: &[u8]) -> bool {
        let len = self.code.len();
        if window.len() < len {
            return false;
        }
        match self.relocation_offset {
            None => window[..len] == *self.code,
            Some(reloc) => {
                let after = reloc.saturating_add(RELOCATION_WINDOW);
                if after > len {
                    return false;
                }
                window[..reloc] == self.code[..reloc] && window[after..len] == self.code[after..]
            }
        }
    }
}

/// Why a `.text.` section did not make it into the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// More than one relocation applies to the section.
    TooManyRelocations { count: usize },
    /// The single relocation is not of [`SUPPORTED_RELOCATION_KIND`].
    UnsupportedRelocation { relocation_kind: u32 },
    /// The relocation window does not fit inside the code.
    RelocationOutOfBounds { offset: u64, len: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooManyRelocations { count } => {
                write!(f, "too many relocation entries ({count})")
            }
            SkipReason::UnsupportedRelocation { relocation_kind } => {
                write!(f, "invalid relocation entry of type {relocation_kind}")
            }
            SkipReason::RelocationOutOfBounds { offset, len } => {
                write!(f, "relocation at offset {offset} does not fit in {len} code bytes")
            }
        }
    }
}

/// A function left out of the catalog, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFunction {
    pub name: String,
    pub reason: SkipReason,
}

/// Signature catalog of one platform's import library.
#[derive(Debug, Clone)]
pub struct PlatformLibrary<'data> {
    platform: String,
    functions: Vec<FunctionSignature<'data>>,
    skipped: Vec<SkippedFunction>,
}

impl<'data> PlatformLibrary<'data> {
    /// Build the catalog from a loaded import library archive.
    ///
    /// The archive must hold exactly a symbol table, a string table and one
    /// object member; see [`library_object`].
    pub fn from_archive(
        platform: impl Into<String>,
        archive: &'data Archive,
    ) -> Result<Self, CatalogError> {
        let platform = platform.into();
        let member = library_object(archive).map_err(|reason| CatalogError::InvalidShape {
            platform: platform.clone(),
            reason,
        })?;
        let object = ElfObject::parse(&member.data).map_err(|source| CatalogError::Object {
            platform: platform.clone(),
            member: member.name.clone(),
            source,
        })?;
        Self::from_object(platform, &object)
    }

    /// Build the catalog from any structural object view.
    pub fn from_object<O>(platform: impl Into<String>, object: &O) -> Result<Self, CatalogError>
    where
        O: ObjectFile<'data> + ?Sized,
    {
        let platform = platform.into();
        let mut functions = Vec::new();
        let mut skipped = Vec::new();

        for section in object.sections() {
            let Some(name) = section.name.strip_prefix(FUNCTION_SECTION_PREFIX) else {
                continue;
            };
            match build_signature(name, &section, object) {
                Ok(signature) => functions.push(signature),
                Err(reason) => {
                    log::warn!("Ignored function \"{name}\" for {platform} because of {reason}");
                    skipped.push(SkippedFunction { name: name.to_string(), reason });
                }
            }
        }

        log::info!("Found {} functions for {}", functions.len(), platform);
        if functions.is_empty() {
            return Err(CatalogError::NoFunctions { platform });
        }
        Ok(Self { platform, functions, skipped })
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Signatures in section order; scan results index into this slice.
    pub fn functions(&self) -> &[FunctionSignature<'data>] {
        &self.functions
    }

    pub fn function(&self, index: usize) -> Option<&FunctionSignature<'data>> {
        self.functions.get(index)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Functions dropped while building the catalog.
    pub fn skipped(&self) -> &[SkippedFunction] {
        &self.skipped
    }
}

/// Validate the import-library layout and return its object member.
///
/// Expected members, in order: `/`, `//`, `<name>.o`.
pub fn library_object(archive: &Archive) -> Result<&ArchiveEntry, String> {
    let entries = archive.entries();
    if entries.len() != 3 {
        return Err(format!("expected 3 archive members, found {}", entries.len()));
    }
    if entries[0].name != SYMBOL_TABLE_NAME {
        return Err(format!("expected symbol table as first member, found `{}`", entries[0].name));
    }
    if entries[1].name != STRING_TABLE_NAME {
        return Err(format!("expected string table as second member, found `{}`", entries[1].name));
    }
    if !entries[2].name.ends_with(OBJECT_EXTENSION) {
        return Err(format!("expected an object file as third member, found `{}`", entries[2].name));
    }
    Ok(&entries[2])
}

fn build_signature<'data, O>(
    name: &str,
    section: &Section<'data>,
    object: &O,
) -> Result<FunctionSignature<'data>, SkipReason>
where
    O: ObjectFile<'data> + ?Sized,
{
    let code = section.data;
    let relocations = object
        .relocations(&format!(".rel{}", section.name))
        .or_else(|| object.relocations(&format!(".rela{}", section.name)))
        .unwrap_or(&[]);
    let relocation_offset = match relocations {
        [] => None,
        [entry] if entry.kind != SUPPORTED_RELOCATION_KIND => {
            return Err(SkipReason::UnsupportedRelocation { relocation_kind: entry.kind });
        }
        [entry] => {
            let offset = usize::try_from(entry.offset)
                .ok()
                .filter(|offset| offset.saturating_add(RELOCATION_WINDOW) <= code.len())
                .ok_or(SkipReason::RelocationOutOfBounds {
                    offset: entry.offset,
                    len: code.len(),
                })?;
            Some(offset)
        }
        many => return Err(SkipReason::TooManyRelocations { count: many.len() }),
    };

    let symbol_table_index = jump_table_index(code);
    if symbol_table_index.is_none() {
        log::warn!("Unknown function format \"{name}\" is {}B long", code.len());
    }

    Ok(FunctionSignature {
        name: name.to_string(),
        code,
        relocation_offset,
        symbol_table_index,
    })
}

/// Jump-table slot of a 12-byte stub: the little-endian word at offset 8 is a
/// byte offset into a table of 4-byte entries.
fn jump_table_index(code: &[u8]) -> Option<u32> {
    if code.len() != JUMP_TABLE_STUB_SIZE {
        return None;
    }
    let word: [u8; 4] = code[JUMP_TABLE_OFFSET_POS..JUMP_TABLE_STUB_SIZE].try_into().ok()?;
    Some(u32::from_le_bytes(word) / 4)
}
