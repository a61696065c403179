//! Fixture builders shared by the integration tests.
//!
//! The archive, ELF, app-binary and package builders live with the core crate's
//! tests; this module adds SDK and package layouts on top of them.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

#[path = "../../../core/tests/common/mod.rs"]
mod fixtures;

pub use fixtures::*;

/// 12-byte jump-table stub for slot 4.
pub const WINDOW_CREATE: &[u8] =
    &[0x00, 0xB5, 0x01, 0x4B, 0x18, 0x47, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00];

/// Import library bytes holding `window_create` and a relocated `app_log`.
pub fn sample_library() -> Vec<u8> {
    let object = elf_object(&[
        Stub::plain("window_create", WINDOW_CREATE),
        Stub { name: "app_log", code: &[0x10, 0x20, 0, 0, 0, 0, 0x30], relocations: &[(2, 30)] },
        Stub {
            name: "broken",
            code: &[1, 2, 3, 4, 5, 6, 7, 8],
            relocations: &[(0, 30), (4, 30)],
        },
    ]);
    import_library(&object)
}

/// Write `<sdk>/pebble/<platform>/lib/libpebble.a`.
pub fn install_library(sdk: &Path, platform: &str) -> PathBuf {
    let dir = sdk.join("pebble").join(platform).join("lib");
    std::fs::create_dir_all(&dir).expect("create lib dir");
    let path = dir.join("libpebble.a");
    std::fs::write(&path, sample_library()).expect("write library");
    path
}

/// App code calling `window_create` twice and `app_log` once.
pub fn sample_code() -> Vec<u8> {
    let mut code = vec![0xFF, 0xFF];
    code.extend_from_slice(WINDOW_CREATE);
    code.extend_from_slice(&[0x10, 0x20, 0xDE, 0xAD, 0xBE, 0xEF, 0x30]);
    code.extend_from_slice(WINDOW_CREATE);
    code
}

/// Write a `.pbw` with one sample binary per platform.
pub fn write_package(dir: &Path, platforms: &[&str]) -> PathBuf {
    let binary = app_binary(&sample_code());
    let names: Vec<String> = platforms.iter().map(|p| format!("{p}/pebble-app.bin")).collect();
    let mut members: Vec<(&str, &[u8])> = vec![("appinfo.json", &b"{}"[..])];
    members.extend(names.iter().map(|name| (name.as_str(), binary.as_slice())));
    let path = dir.join("app.pbw");
    std::fs::write(&path, pbw(&members)).expect("write package");
    path
}
