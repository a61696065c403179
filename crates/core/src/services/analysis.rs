use std::io::{Read, Seek};
use std::path::Path;

use thiserror::Error;

use crate::archive::{Archive, ArchiveError};
use crate::catalog::{CatalogError, PlatformLibrary};
use crate::config::ToolConfig;
use crate::model::compare_platforms;
use crate::package::{AppPackage, PackageError};
use crate::report::{FailureStage, PlatformFailure, PlatformReport};
use crate::scan::{AppBinary, ScanError};

/// Errors that stop one platform, never the whole run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Package(#[from] PackageError),
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Outcome of analyzing every binary in a package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageAnalysis {
    /// Successful scans, in platform order.
    pub platforms: Vec<PlatformReport>,
    /// Platforms that were dropped, in platform order.
    pub failures: Vec<PlatformFailure>,
}

impl PackageAnalysis {
    /// Whether the run counts as a success.
    ///
    /// By default any failure fails the run. With `single_failures`, the run
    /// only fails when no platform succeeded.
    pub fn succeeded(&self, single_failures: bool) -> bool {
        if single_failures {
            !self.platforms.is_empty()
        } else {
            self.failures.is_empty()
        }
    }
}

/// Runs the library-load, catalog-build and scan pipeline per platform.
pub struct PackageAnalyzer<'a> {
    pub config: &'a ToolConfig,
}

impl<'a> PackageAnalyzer<'a> {
    pub fn new(config: &'a ToolConfig) -> Self {
        Self { config }
    }

    /// Open the package at `path` and analyze it.
    ///
    /// Only a package that cannot be opened (or holds no binaries) is an error;
    /// per-platform problems end up in [`PackageAnalysis::failures`].
    pub fn analyze_path(&self, path: impl AsRef<Path>) -> Result<PackageAnalysis, PackageError> {
        let mut package = AppPackage::open(path)?;
        Ok(self.analyze(&mut package))
    }

    /// Analyze every binary of an opened package.
    pub fn analyze<R: Read + Seek>(&self, package: &mut AppPackage<R>) -> PackageAnalysis {
        let mut order: Vec<(usize, String)> = package
            .binaries()
            .iter()
            .enumerate()
            .map(|(index, info)| (index, info.platform.clone()))
            .collect();
        order.sort_by(|a, b| compare_platforms(&a.1, &b.1));

        let mut analysis = PackageAnalysis::default();
        let mut rest = order.as_slice();
        while let Some((_, platform)) = rest.first() {
            let count = rest.iter().take_while(|(_, p)| p == platform).count();
            let (group, tail) = rest.split_at(count);
            let indices: Vec<usize> = group.iter().map(|(index, _)| *index).collect();
            self.analyze_platform(package, platform, &indices, &mut analysis);
            rest = tail;
        }
        analysis
    }

    fn analyze_platform<R: Read + Seek>(
        &self,
        package: &mut AppPackage<R>,
        platform: &str,
        binaries: &[usize],
        analysis: &mut PackageAnalysis,
    ) {
        let path = self.config.library_path(platform);
        log::debug!("Loading import library for {platform} from {}", path.display());
        let archive = match Archive::load(&path) {
            Ok(archive) => archive,
            Err(err) => {
                return record_failure(analysis, platform, FailureStage::Library, err.into())
            }
        };
        let library = match PlatformLibrary::from_archive(platform, &archive) {
            Ok(library) => library,
            Err(err) => {
                return record_failure(analysis, platform, FailureStage::Library, err.into())
            }
        };

        for &index in binaries {
            match scan_binary(package, index, &library) {
                Ok(report) => analysis.platforms.push(report),
                Err(err) => record_failure(analysis, platform, FailureStage::Binary, err),
            }
        }
    }
}

/// Extract, scan and summarize one binary.
pub fn scan_binary<R: Read + Seek>(
    package: &mut AppPackage<R>,
    index: usize,
    library: &PlatformLibrary<'_>,
) -> Result<PlatformReport, AnalysisError> {
    let bytes = package.extract(index)?;
    let mut binary = AppBinary::new(library.platform(), bytes)?;
    binary.scan(library);
    Ok(PlatformReport::from_scan(&binary, library))
}

fn record_failure(
    analysis: &mut PackageAnalysis,
    platform: &str,
    stage: FailureStage,
    err: AnalysisError,
) {
    log::error!("Skipping {platform}: {err}");
    analysis.failures.push(PlatformFailure {
        platform: platform.to_string(),
        stage,
        error: err.to_string(),
    });
}
