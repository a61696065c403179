use pbw_api_info::{init_logging, parse_lib_path, sha256_file};
use tempfile::tempdir;

#[test]
fn sha256_file_matches_known_hash() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("abc.bin");
    std::fs::write(&path, b"abc").expect("write");

    let hash = sha256_file(&path).expect("hash");
    assert_eq!(hash, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
}

#[test]
fn sha256_file_fails_for_missing_file() {
    let dir = tempdir().expect("tempdir");
    let err = sha256_file(&dir.path().join("missing")).unwrap_err();
    assert!(err.to_string().contains("Failed to open file for hashing"));
}

#[test]
fn parse_lib_path_splits_on_first_equals() {
    assert_eq!(
        parse_lib_path("basalt=/opt/lib=odd/libpebble.a").expect("parse"),
        ("basalt".to_string(), "/opt/lib=odd/libpebble.a".to_string())
    );
}

#[test]
fn parse_lib_path_rejects_incomplete_values() {
    for raw in ["basalt", "=/opt/libpebble.a", "basalt="] {
        let err = parse_lib_path(raw).unwrap_err();
        assert!(err.to_string().contains("PLATFORM=PATH"), "{raw}: {err}");
    }
}

#[test]
fn init_logging_can_be_called_twice() {
    init_logging(false);
    init_logging(true);
}
