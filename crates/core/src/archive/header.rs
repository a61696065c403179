use crate::archive::{ArchiveEntry, ArchiveError};

/// Size of one fixed-layout member header.
pub const HEADER_SIZE: usize = 60;

/// Name stored for the library-wide symbol index member.
pub const SYMBOL_TABLE_NAME: &str = "/";

/// Name stored for the extended member-name table.
pub const STRING_TABLE_NAME: &str = "//";

const NAME_LEN: usize = 16;
const SIZE_START: usize = 48;
const SIZE_LEN: usize = 10;
const TRAILER_START: usize = 58;
const TRAILER: [u8; 2] = [0x60, 0x0A];

const SYMBOL_TABLE_FIELD: &[u8; NAME_LEN] = b"/               ";
const STRING_TABLE_FIELD: &[u8; NAME_LEN] = b"//              ";

/// Borrowed view of the fields of a member header we care about.
///
/// Date, uid, gid and mode are carried by the format but unused here.
#[derive(Debug)]
pub(crate) struct MemberHeader<'a> {
    pub name_field: &'a [u8],
    pub size_field: &'a [u8],
}

impl<'a> MemberHeader<'a> {
    /// Split a 60-byte header and verify its trailer bytes.
    ///
    /// `offset` is the header's position in the file, used for error reporting.
    pub fn parse(raw: &'a [u8], offset: usize) -> Result<Self, ArchiveError> {
        if raw.len() < HEADER_SIZE {
            return Err(ArchiveError::TruncatedHeader { offset });
        }
        if raw[TRAILER_START..HEADER_SIZE] != TRAILER {
            return Err(ArchiveError::BadTrailer { offset });
        }
        Ok(Self {
            name_field: &raw[..NAME_LEN],
            size_field: &raw[SIZE_START..SIZE_START + SIZE_LEN],
        })
    }

    /// Declared member size.
    pub fn size(&self, offset: usize) -> Result<u64, ArchiveError> {
        parse_decimal(self.size_field).ok_or_else(|| ArchiveError::InvalidSize {
            offset,
            field: field_text(self.size_field),
        })
    }

    /// Resolve the member name against the entries parsed so far.
    pub fn resolve_name(&self, parsed: &[ArchiveEntry]) -> Result<String, ArchiveError> {
        resolve_name(self.name_field, parsed)
    }
}

/// Parse an unsigned decimal the way the archive size and long-name fields are
/// written: leading whitespace is skipped, digits are consumed up to the first
/// non-digit, and a field without a leading digit is rejected.
pub(crate) fn parse_decimal(field: &[u8]) -> Option<u64> {
    let digits = field.iter().skip_while(|b| b.is_ascii_whitespace());
    let mut value: Option<u64> = None;
    for &b in digits {
        if !b.is_ascii_digit() {
            break;
        }
        let acc = value.unwrap_or(0);
        value = Some(acc.checked_mul(10)?.checked_add(u64::from(b - b'0'))?);
    }
    value
}

fn resolve_name(field: &[u8], parsed: &[ArchiveEntry]) -> Result<String, ArchiveError> {
    let index = parsed.len();
    if field == SYMBOL_TABLE_FIELD {
        if index != 0 {
            return Err(ArchiveError::MisplacedSymbolTable { index });
        }
        return Ok(SYMBOL_TABLE_NAME.to_string());
    }
    if field == STRING_TABLE_FIELD {
        if index > 1 {
            return Err(ArchiveError::MisplacedStringTable { index });
        }
        return Ok(STRING_TABLE_NAME.to_string());
    }

    let slash = field
        .iter()
        .rposition(|b| *b == b'/')
        .ok_or_else(|| ArchiveError::UnterminatedName { field: field_text(field) })?;
    if slash > 0 {
        return Ok(String::from_utf8_lossy(&field[..slash]).into_owned());
    }

    // `/<offset>`: the name lives in the string table, terminated by '/'.
    let table = parsed
        .iter()
        .find(|entry| entry.name == STRING_TABLE_NAME)
        .ok_or_else(|| ArchiveError::MissingStringTable { field: field_text(field) })?;
    let out_of_range = || ArchiveError::LongNameOutOfRange { field: field_text(field) };
    let start = parse_decimal(&field[1..])
        .and_then(|offset| usize::try_from(offset).ok())
        .filter(|offset| *offset < table.data.len())
        .ok_or_else(out_of_range)?;
    let len = table.data[start..].iter().position(|b| *b == b'/').ok_or_else(out_of_range)?;
    Ok(String::from_utf8_lossy(&table.data[start..start + len]).into_owned())
}

fn field_text(field: &[u8]) -> String {
    String::from_utf8_lossy(field).trim_end().to_string()
}
