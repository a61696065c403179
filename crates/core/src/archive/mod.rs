//! Reader for System V / GNU `ar` archives, the container used for static
//! import libraries such as `libpebble.a`.
//!
//! An archive is an 8-byte magic followed by members. Each member is a 60-byte
//! ASCII header immediately followed by its data; headers always start on an
//! even file offset, so odd-sized data is followed by one pad byte.
//!
//! Two members are special:
//! - `/`, the symbol table, which may only be the first member.
//! - `//`, the extended-name table, which may only be the first or second member.
//!   Members whose names do not fit the 16-byte name field reference it as
//!   `/<offset>`.

mod header;

use std::path::{Path, PathBuf};

use thiserror::Error;

use header::MemberHeader;
pub use header::{HEADER_SIZE, STRING_TABLE_NAME, SYMBOL_TABLE_NAME};

/// Magic bytes every archive starts with.
pub const AR_MAGIC: &[u8; 8] = b"!<arch>\n";

/// Error type for archive decoding.
///
/// Every variant aborts the whole load; an archive is never returned partially.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to read archive {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not an ar archive: missing `!<arch>` magic")]
    BadMagic,

    #[error("Truncated member header at offset {offset}")]
    TruncatedHeader { offset: usize },

    #[error("Invalid header trailer at offset {offset}")]
    BadTrailer { offset: usize },

    #[error("Unparsable member size {field:?} in header at offset {offset}")]
    InvalidSize { offset: usize, field: String },

    #[error("Member `{name}` at offset {offset} declares a size of zero")]
    EmptyMember { name: String, offset: usize },

    #[error(
        "Truncated data for member `{name}`: {size} bytes declared at offset {offset}, \
         {available} available"
    )]
    TruncatedBody { name: String, offset: usize, size: u64, available: usize },

    #[error("Symbol table member must be the first entry, found at index {index}")]
    MisplacedSymbolTable { index: usize },

    #[error("String table member must be the first or second entry, found at index {index}")]
    MisplacedStringTable { index: usize },

    #[error("Member name {field:?} has no `/` terminator")]
    UnterminatedName { field: String },

    #[error("Long member name {field:?} used before any string table")]
    MissingStringTable { field: String },

    #[error("Long member name {field:?} points outside the string table")]
    LongNameOutOfRange { field: String },
}

/// One decoded archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Resolved member name (`/` and `//` for the special members).
    pub name: String,
    /// Declared data size in bytes.
    pub size: usize,
    /// File offset of the first data byte.
    pub offset: usize,
    /// Member data, owned by the archive.
    pub data: Vec<u8>,
}

/// Decoded archive: members in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    entries: Vec<ArchiveEntry>,
}

impl Archive {
    /// Read and decode the archive at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|source| ArchiveError::Io { path: path.to_path_buf(), source })?;
        let archive = Self::parse(&bytes)?;
        log::debug!("Loaded {} archive members from {}", archive.len(), path.display());
        Ok(archive)
    }

    /// Decode an archive held in memory.
    pub fn parse(bytes: &[u8]) -> Result<Self, ArchiveError> {
        if bytes.len() < AR_MAGIC.len() || &bytes[..AR_MAGIC.len()] != AR_MAGIC {
            return Err(ArchiveError::BadMagic);
        }

        let mut entries: Vec<ArchiveEntry> = Vec::new();
        let mut pos = AR_MAGIC.len();
        while pos < bytes.len() {
            if pos % 2 == 1 {
                pos += 1;
                // Trailing pad after the last member.
                if pos >= bytes.len() {
                    break;
                }
            }

            let raw = bytes
                .get(pos..pos + HEADER_SIZE)
                .ok_or(ArchiveError::TruncatedHeader { offset: pos })?;
            let header = MemberHeader::parse(raw, pos)?;
            let name = header.resolve_name(&entries)?;
            let size = header.size(pos)?;
            let offset = pos + HEADER_SIZE;
            if size == 0 {
                return Err(ArchiveError::EmptyMember { name, offset });
            }

            let available = bytes.len() - offset;
            let end = usize::try_from(size)
                .ok()
                .filter(|size| *size <= available)
                .map(|size| offset + size)
                .ok_or_else(|| ArchiveError::TruncatedBody {
                    name: name.clone(),
                    offset,
                    size,
                    available,
                })?;

            log::trace!("Archive member `{name}`: {size} bytes at offset {offset}");
            entries.push(ArchiveEntry {
                name,
                size: end - offset,
                offset,
                data: bytes[offset..end].to_vec(),
            });
            pos = end;
        }

        Ok(Self { entries })
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Members in file order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&ArchiveEntry> {
        self.entries.get(index)
    }

    /// Index of the first member called `name`.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == name)
    }
}
