use std::path::Path;

use anyhow::{Context, Result};
use pbw_api_core::model::compare_platforms;
use pbw_api_core::package::AppPackage;
use pbw_api_core::report::AppInfo;
use pbw_api_core::scan::AppHeader;
use serde::Serialize;

use crate::commands::print_json;

/// One app binary found in a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinaryRow {
    pub platform: String,
    pub member: String,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<AppInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Describe every binary of the package at `path`, in platform order.
///
/// A binary whose header cannot be decoded is still listed, with `error` set.
pub fn package_binaries(path: &Path) -> Result<Vec<BinaryRow>> {
    let mut package = AppPackage::open(path)
        .with_context(|| format!("Failed to open app package {}", path.display()))?;

    let mut rows = Vec::with_capacity(package.binaries().len());
    for index in 0..package.binaries().len() {
        let bytes = package.extract(index)?;
        let info = &package.binaries()[index];
        let (app, error) = match AppHeader::parse(&bytes) {
            Ok(header) => (Some(AppInfo::from(&header)), None),
            Err(err) => (None, Some(err.to_string())),
        };
        rows.push(BinaryRow {
            platform: info.platform.clone(),
            member: info.member.clone(),
            size: bytes.len(),
            app,
            error,
        });
    }
    rows.sort_by(|a, b| compare_platforms(&a.platform, &b.platform));
    Ok(rows)
}

/// List the app binaries inside a `.pbw` package.
pub fn binaries_command(path: &Path, json: bool) -> Result<()> {
    let rows = package_binaries(path)?;

    if json {
        return print_json(&rows);
    }

    println!("Binaries ({}):", rows.len());
    for row in rows {
        match (&row.app, &row.error) {
            (Some(app), _) => println!(
                "  - {} ({}, {} bytes): {} by {}, version {}, SDK {}",
                row.platform,
                row.member,
                row.size,
                app.name,
                app.company,
                app.app_version,
                app.sdk_version
            ),
            (None, error) => println!(
                "  - {} ({}, {} bytes): {}",
                row.platform,
                row.member,
                row.size,
                error.as_deref().unwrap_or("unreadable header")
            ),
        }
    }
    Ok(())
}
