//! Serializable report types produced from catalogs and scans.
//!
//! Per-platform match lists keep every repeat exactly as the scanner produced
//! them. [`group_api_usage`] is a separate, explicitly aggregated view that
//! correlates one API across platforms through its jump-table index.

use serde::{Deserialize, Serialize};

use crate::catalog::PlatformLibrary;
use crate::scan::{AppBinary, AppHeader};

/// Identifying fields of an app binary header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    pub company: String,
    pub uuid: String,
    pub sdk_version: String,
    pub app_version: String,
}

impl From<&AppHeader> for AppInfo {
    fn from(header: &AppHeader) -> Self {
        Self {
            name: header.name.clone(),
            company: header.company.clone(),
            uuid: header.uuid_string(),
            sdk_version: header.sdk_version.to_string(),
            app_version: header.app_version.to_string(),
        }
    }
}

/// A catalog function as exposed to reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub index: usize,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_index: Option<u32>,
    pub size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relocation_offset: Option<usize>,
}

/// Catalog listing in catalog order.
pub fn catalog_entries(library: &PlatformLibrary<'_>) -> Vec<CatalogEntry> {
    library
        .functions()
        .iter()
        .enumerate()
        .map(|(index, f)| CatalogEntry {
            index,
            name: f.name.clone(),
            symbol_index: f.symbol_table_index,
            size: f.len(),
            relocation_offset: f.relocation_offset,
        })
        .collect()
}

/// One match of a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedFunction {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_index: Option<u32>,
}

/// Scan result of one platform's binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformReport {
    pub platform: String,
    pub app: AppInfo,
    /// Number of signatures the binary was scanned against.
    pub catalog_size: usize,
    /// Matches in discovery order, repeats included.
    pub used_functions: Vec<UsedFunction>,
}

impl PlatformReport {
    /// Build the report of a scanned binary.
    pub fn from_scan(binary: &AppBinary, library: &PlatformLibrary<'_>) -> Self {
        let used_functions = binary
            .used_functions()
            .iter()
            .filter_map(|index| library.function(*index))
            .map(|f| UsedFunction { name: f.name.clone(), symbol_index: f.symbol_table_index })
            .collect();
        Self {
            platform: binary.platform().to_string(),
            app: AppInfo::from(binary.header()),
            catalog_size: library.len(),
            used_functions,
        }
    }
}

/// Pipeline stage a platform failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Library,
    Binary,
}

/// A platform that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformFailure {
    pub platform: String,
    pub stage: FailureStage,
    pub error: String,
}

/// One API used somewhere in the package, correlated across platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_index: Option<u32>,
    /// Distinct names seen for this API, in first-seen order.
    pub names: Vec<String>,
    /// Platforms whose binary uses it, in report order.
    pub platforms: Vec<String>,
    /// Total number of matches across platforms.
    pub occurrences: usize,
}

/// Group matches by jump-table index, or by name for functions without one.
pub fn group_api_usage(platforms: &[PlatformReport]) -> Vec<ApiUsage> {
    let mut groups: Vec<ApiUsage> = Vec::new();
    for report in platforms {
        for used in &report.used_functions {
            let existing = groups.iter().position(|g| match used.symbol_index {
                Some(index) => g.symbol_index == Some(index),
                None => g.symbol_index.is_none() && g.names.contains(&used.name),
            });
            let slot = existing.unwrap_or_else(|| {
                groups.push(ApiUsage {
                    symbol_index: used.symbol_index,
                    names: Vec::new(),
                    platforms: Vec::new(),
                    occurrences: 0,
                });
                groups.len() - 1
            });
            let group = &mut groups[slot];
            if !group.names.contains(&used.name) {
                group.names.push(used.name.clone());
            }
            if !group.platforms.contains(&report.platform) {
                group.platforms.push(report.platform.clone());
            }
            group.occurrences += 1;
        }
    }
    groups
}

/// Complete report of one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiReport {
    /// Package path as given by the caller.
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    pub platforms: Vec<PlatformReport>,
    pub failures: Vec<PlatformFailure>,
    pub apis: Vec<ApiUsage>,
}

impl ApiReport {
    /// Assemble a report; `apis` is derived from `platforms`.
    pub fn new(
        input: impl Into<String>,
        platforms: Vec<PlatformReport>,
        failures: Vec<PlatformFailure>,
    ) -> Self {
        let apis = group_api_usage(&platforms);
        Self { input: input.into(), sha256: None, generated_at: None, platforms, failures, apis }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> AppInfo {
        AppInfo {
            name: "App".into(),
            company: "Co".into(),
            uuid: "00000000-0000-0000-0000-000000000000".into(),
            sdk_version: "5.86".into(),
            app_version: "1.0".into(),
        }
    }

    fn used(name: &str, symbol_index: Option<u32>) -> UsedFunction {
        UsedFunction { name: name.into(), symbol_index }
    }

    #[test]
    fn grouping_correlates_platforms_by_symbol_index() {
        let platforms = vec![
            PlatformReport {
                platform: "aplite".into(),
                app: app(),
                catalog_size: 3,
                used_functions: vec![
                    used("window_create", Some(12)),
                    used("app_log", None),
                    used("window_create", Some(12)),
                ],
            },
            PlatformReport {
                platform: "basalt".into(),
                app: app(),
                catalog_size: 3,
                used_functions: vec![used("window_create__deprecated", Some(12))],
            },
        ];
        let groups = group_api_usage(&platforms);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].symbol_index, Some(12));
        assert_eq!(groups[0].names, ["window_create", "window_create__deprecated"]);
        assert_eq!(groups[0].platforms, ["aplite", "basalt"]);
        assert_eq!(groups[0].occurrences, 3);
        assert_eq!(groups[1].symbol_index, None);
        assert_eq!(groups[1].names, ["app_log"]);
    }

    #[test]
    fn per_platform_matches_keep_repeats_when_serialized() {
        let report = ApiReport::new(
            "app.pbw",
            vec![PlatformReport {
                platform: "basalt".into(),
                app: app(),
                catalog_size: 1,
                used_functions: vec![used("foo", None), used("foo", None)],
            }],
            vec![],
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["platforms"][0]["used_functions"].as_array().unwrap().len(), 2);
        assert_eq!(json["apis"][0]["occurrences"], 2);
        assert!(json.get("sha256").is_none());
    }
}
