mod common;

use std::io::Cursor;
use std::path::Path;

use common::{app_binary, elf_object, import_library, pbw, Stub};
use pbw_api_core::config::ToolConfig;
use pbw_api_core::package::{AppPackage, PackageError};
use pbw_api_core::report::{ApiReport, FailureStage};
use pbw_api_core::services::analysis::{PackageAnalysis, PackageAnalyzer};

const WINDOW_CREATE: &[u8] =
    &[0x00, 0xB5, 0x01, 0x4B, 0x18, 0x47, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00];

/// Write `<sdk>/pebble/<platform>/lib/libpebble.a` with two stubs.
fn install_library(sdk: &Path, platform: &str) {
    let dir = sdk.join("pebble").join(platform).join("lib");
    std::fs::create_dir_all(&dir).unwrap();
    let object = elf_object(&[
        Stub::plain("window_create", WINDOW_CREATE),
        Stub { name: "app_log", code: &[0x10, 0x20, 0, 0, 0, 0, 0x30], relocations: &[(2, 30)] },
    ]);
    std::fs::write(dir.join("libpebble.a"), import_library(&object)).unwrap();
}

fn config_for(sdk: &Path) -> ToolConfig {
    ToolConfig { sdk_root: sdk.to_string_lossy().into_owned(), ..ToolConfig::default() }
}

fn analyze(config: &ToolConfig, members: &[(&str, &[u8])]) -> PackageAnalysis {
    let mut package = AppPackage::from_reader(Cursor::new(pbw(members))).expect("package");
    PackageAnalyzer::new(config).analyze(&mut package)
}

fn app_code() -> Vec<u8> {
    let mut code = vec![0xFF, 0xFF];
    code.extend_from_slice(WINDOW_CREATE);
    code.extend_from_slice(&[0x10, 0x20, 0xDE, 0xAD, 0xBE, 0xEF, 0x30]);
    code.extend_from_slice(WINDOW_CREATE);
    code
}

#[test]
fn platforms_are_scanned_in_platform_order() {
    let sdk = tempfile::tempdir().unwrap();
    install_library(sdk.path(), "aplite");
    install_library(sdk.path(), "basalt");
    let config = config_for(sdk.path());

    let analysis = analyze(
        &config,
        &[
            ("basalt/pebble-app.bin", &app_binary(&app_code())),
            ("aplite/pebble-app.bin", &app_binary(&app_code())),
        ],
    );

    assert!(analysis.failures.is_empty(), "{:?}", analysis.failures);
    let platforms: Vec<&str> = analysis.platforms.iter().map(|p| p.platform.as_str()).collect();
    assert_eq!(platforms, ["aplite", "basalt"]);

    let basalt = &analysis.platforms[1];
    assert_eq!(basalt.catalog_size, 2);
    assert_eq!(basalt.app.name, "Fixture App");
    let used: Vec<&str> = basalt.used_functions.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(used, ["window_create", "app_log", "window_create"]);
    assert_eq!(basalt.used_functions[0].symbol_index, Some(4));
    assert!(analysis.succeeded(false));
}

#[test]
fn missing_library_drops_only_that_platform() {
    let sdk = tempfile::tempdir().unwrap();
    install_library(sdk.path(), "basalt");
    let config = config_for(sdk.path());

    let analysis = analyze(
        &config,
        &[
            ("chalk/pebble-app.bin", &app_binary(&app_code())),
            ("basalt/pebble-app.bin", &app_binary(&app_code())),
        ],
    );

    assert_eq!(analysis.platforms.len(), 1);
    assert_eq!(analysis.platforms[0].platform, "basalt");
    assert_eq!(analysis.failures.len(), 1);
    assert_eq!(analysis.failures[0].platform, "chalk");
    assert_eq!(analysis.failures[0].stage, FailureStage::Library);
    assert!(analysis.failures[0].error.contains("libpebble.a"));

    assert!(!analysis.succeeded(false));
    assert!(analysis.succeeded(true));
}

#[test]
fn truncated_binary_is_a_binary_stage_failure() {
    let sdk = tempfile::tempdir().unwrap();
    install_library(sdk.path(), "diorite");
    let config = config_for(sdk.path());

    let analysis = analyze(&config, &[("diorite/pebble-app.bin", b"PBLAPP\0\0short")]);

    assert!(analysis.platforms.is_empty());
    assert_eq!(analysis.failures[0].stage, FailureStage::Binary);
    assert!(!analysis.succeeded(true));
}

#[test]
fn explicit_library_path_overrides_sdk_layout() {
    let sdk = tempfile::tempdir().unwrap();
    install_library(sdk.path(), "basalt");
    let mut config = ToolConfig {
        sdk_root: sdk.path().join("nowhere").to_string_lossy().into_owned(),
        ..ToolConfig::default()
    };
    let lib = sdk.path().join("pebble/basalt/lib/libpebble.a");
    config.lib_paths.insert("emery".into(), lib.to_string_lossy().into_owned());

    let analysis = analyze(&config, &[("emery/pebble-app.bin", &app_binary(&app_code()))]);
    assert!(analysis.failures.is_empty(), "{:?}", analysis.failures);
    assert_eq!(analysis.platforms[0].platform, "emery");
}

#[test]
fn report_groups_usage_across_platforms() {
    let sdk = tempfile::tempdir().unwrap();
    install_library(sdk.path(), "aplite");
    install_library(sdk.path(), "basalt");
    let config = config_for(sdk.path());

    let analysis = analyze(
        &config,
        &[
            ("aplite/pebble-app.bin", &app_binary(WINDOW_CREATE)),
            ("basalt/pebble-app.bin", &app_binary(&app_code())),
        ],
    );
    let report = ApiReport::new("app.pbw", analysis.platforms, analysis.failures);

    assert_eq!(report.apis.len(), 2);
    assert_eq!(report.apis[0].names, ["window_create"]);
    assert_eq!(report.apis[0].platforms, ["aplite", "basalt"]);
    assert_eq!(report.apis[0].occurrences, 3);
    assert_eq!(report.apis[1].names, ["app_log"]);
    assert_eq!(report.apis[1].platforms, ["basalt"]);
}

#[test]
fn analyze_path_fails_only_for_unreadable_packages() {
    let dir = tempfile::tempdir().unwrap();
    let config = ToolConfig::default();
    let analyzer = PackageAnalyzer::new(&config);

    let err = analyzer.analyze_path(dir.path().join("missing.pbw")).unwrap_err();
    assert!(matches!(err, PackageError::Open { .. }));

    let empty = dir.path().join("empty.pbw");
    std::fs::write(&empty, pbw(&[("appinfo.json", b"{}")])).unwrap();
    assert!(matches!(analyzer.analyze_path(&empty), Err(PackageError::NoBinaries)));
}
