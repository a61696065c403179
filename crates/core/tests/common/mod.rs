//! Fixture builders shared by the integration tests.
#![allow(dead_code)]

use std::io::{Cursor, Write};

use object::write::{Object, Relocation, Symbol, SymbolSection};
use object::{
    Architecture, BinaryFormat, Endianness, RelocationFlags, SectionKind, SymbolFlags,
    SymbolKind, SymbolScope,
};
use pbw_api_core::scan::{APP_HEADER_SIZE, APP_MAGIC};

/// One 60-byte member header with the given raw name and size fields.
pub fn member_header(name_field: &str, size_field: &str) -> Vec<u8> {
    let mut header = format!(
        "{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}",
        name_field, "0", "0", "0", "644", size_field
    )
    .into_bytes();
    header.extend_from_slice(b"`\n");
    assert_eq!(header.len(), 60, "fixture header must be 60 bytes");
    header
}

/// A complete archive; members are padded to even offsets like `ar` does.
pub fn archive(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = b"!<arch>\n".to_vec();
    for (name_field, data) in members {
        if out.len() % 2 == 1 {
            out.push(b'\n');
        }
        out.extend(member_header(name_field, &data.len().to_string()));
        out.extend_from_slice(data);
    }
    if out.len() % 2 == 1 {
        out.push(b'\n');
    }
    out
}

/// Per-function section spec for [`elf_object`].
pub struct Stub<'a> {
    pub name: &'a str,
    pub code: &'a [u8],
    /// `(offset, relocation type)` pairs applied to the section.
    pub relocations: &'a [(u64, u32)],
}

impl<'a> Stub<'a> {
    pub fn plain(name: &'a str, code: &'a [u8]) -> Self {
        Self { name, code, relocations: &[] }
    }
}

/// A 32-bit ARM relocatable object, with `.rel.text.<name>` relocation sections
/// like the SDK's stub library.
pub fn elf_object(stubs: &[Stub<'_>]) -> Vec<u8> {
    elf_object_for(Architecture::Arm, stubs)
}

/// A relocatable ELF object with one `.text.<name>` section per stub.
///
/// Whether relocations land in `.rel.*` or `.rela.*` sections depends on
/// `architecture`: ARM writes REL, x86-64 writes RELA.
pub fn elf_object_for(architecture: Architecture, stubs: &[Stub<'_>]) -> Vec<u8> {
    let mut obj = Object::new(BinaryFormat::Elf, architecture, Endianness::Little);
    let target = obj.add_symbol(Symbol {
        name: b"jump_table".to_vec(),
        value: 0,
        size: 0,
        kind: SymbolKind::Text,
        scope: SymbolScope::Dynamic,
        weak: false,
        section: SymbolSection::Undefined,
        flags: SymbolFlags::None,
    });

    for stub in stubs {
        let section = obj.add_section(
            Vec::new(),
            format!(".text.{}", stub.name).into_bytes(),
            SectionKind::Text,
        );
        obj.section_mut(section).set_data(stub.code.to_vec(), 4);
        for &(offset, r_type) in stub.relocations {
            obj.add_relocation(
                section,
                Relocation {
                    offset,
                    symbol: target,
                    addend: 0,
                    flags: RelocationFlags::Elf { r_type },
                },
            )
            .expect("add relocation");
        }
    }
    obj.write().expect("write elf object")
}

/// An import library shaped like the SDK's: symtab, strtab, one long-named object.
pub fn import_library(object: &[u8]) -> Vec<u8> {
    archive(&[
        ("/", b"\0\0\0\x01\0\0\0\x08jump_table\0\0"),
        ("//", b"pebble_api_stubs.o/\n"),
        ("/0", object),
    ])
}

/// An app binary with a valid header followed by `code`.
pub fn app_binary(code: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0u8; APP_HEADER_SIZE];
    bytes[..8].copy_from_slice(APP_MAGIC);
    bytes[8..14].copy_from_slice(&[16, 1, 5, 86, 1, 0]);
    bytes[24..35].copy_from_slice(b"Fixture App");
    bytes[56..66].copy_from_slice(b"Fixture Co");
    bytes.extend_from_slice(code);
    bytes
}

/// A `.pbw` zip with the given members.
pub fn pbw(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, data) in members {
        writer.start_file(*name, options).expect("start zip member");
        writer.write_all(data).expect("write zip member");
    }
    writer.finish().expect("finish zip").into_inner()
}
