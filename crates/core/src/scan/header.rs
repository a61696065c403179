use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scan::ScanError;

/// Size of the header every app binary starts with.
pub const APP_HEADER_SIZE: usize = 130;

/// Expected value of [`AppHeader::magic`].
pub const APP_MAGIC: &[u8; 8] = b"PBLAPP\0\0";

const APP_NAME_SIZE: usize = 32;

/// `major.minor` pair as stored in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Decoded app binary header. All integers are little-endian on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppHeader {
    pub magic: [u8; 8],
    pub struct_version: Version,
    pub sdk_version: Version,
    pub app_version: Version,
    pub load_size: u16,
    pub offset: u32,
    pub crc: u32,
    pub name: String,
    pub company: String,
    pub icon_resource_id: u32,
    pub sym_table_addr: u32,
    pub flags: u32,
    pub num_reloc_entries: u32,
    pub uuid: [u8; 16],
    pub resource_crc: u32,
    pub resource_timestamp: u32,
    pub virtual_size: u16,
}

impl AppHeader {
    /// Decode the header at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, ScanError> {
        if bytes.len() < APP_HEADER_SIZE {
            return Err(ScanError::TruncatedHeader { len: bytes.len() });
        }
        let mut r = Reader { bytes, pos: 0 };
        Ok(Self {
            magic: r.array(),
            struct_version: r.version(),
            sdk_version: r.version(),
            app_version: r.version(),
            load_size: u16::from_le_bytes(r.array()),
            offset: r.u32(),
            crc: r.u32(),
            name: r.text(),
            company: r.text(),
            icon_resource_id: r.u32(),
            sym_table_addr: r.u32(),
            flags: r.u32(),
            num_reloc_entries: r.u32(),
            uuid: r.array(),
            resource_crc: r.u32(),
            resource_timestamp: r.u32(),
            virtual_size: u16::from_le_bytes(r.array()),
        })
    }

    pub fn has_valid_magic(&self) -> bool {
        &self.magic == APP_MAGIC
    }

    /// UUID in the usual 8-4-4-4-12 hex form.
    pub fn uuid_string(&self) -> String {
        let hex: Vec<String> = self.uuid.iter().map(|b| format!("{b:02x}")).collect();
        format!(
            "{}-{}-{}-{}-{}",
            hex[0..4].concat(),
            hex[4..6].concat(),
            hex[6..8].concat(),
            hex[8..10].concat(),
            hex[10..16].concat()
        )
    }
}

/// Cursor over a buffer already checked to hold a full header.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.array())
    }

    fn version(&mut self) -> Version {
        let [major, minor] = self.array();
        Version { major, minor }
    }

    /// NUL-padded fixed-width string field.
    fn text(&mut self) -> String {
        let raw: [u8; APP_NAME_SIZE] = self.array();
        let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
        String::from_utf8_lossy(&raw[..end]).into_owned()
    }
}
