//! `.pbw` app packages.
//!
//! A package is a zip file holding one compiled app per platform, at
//! `<platform>/pebble-app.bin`. Older single-platform packages keep the binary
//! at the root, which implies [`DEFAULT_PLATFORM`].

use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::model::{APP_BINARY_NAME, DEFAULT_PLATFORM};

/// Error type for package access.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Could not open app package {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not read app package: {0}")]
    Zip(#[from] ZipError),

    #[error("Could not extract binary for {platform}: {source}")]
    Extract {
        platform: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No pebble-app.bin found in app package")]
    NoBinaries,

    #[error("Binary index {0} out of range")]
    UnknownBinary(usize),
}

/// One app binary located inside a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryInfo {
    /// Platform derived from the member path.
    pub platform: String,
    /// Full member name inside the zip.
    pub member: String,
    zip_index: usize,
}

/// An opened app package and the binaries found in it.
pub struct AppPackage<R: Read + Seek = File> {
    archive: ZipArchive<R>,
    binaries: Vec<BinaryInfo>,
}

impl AppPackage<File> {
    /// Open the package at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PackageError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|source| PackageError::Open { path: path.to_path_buf(), source })?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> AppPackage<R> {
    /// Read the zip directory and locate every app binary.
    ///
    /// Fails with [`PackageError::NoBinaries`] if none is present.
    pub fn from_reader(reader: R) -> Result<Self, PackageError> {
        let mut archive = ZipArchive::new(reader)?;
        let mut binaries = Vec::new();
        for zip_index in 0..archive.len() {
            let member = archive.by_index_raw(zip_index)?.name().to_string();
            let Some(platform) = binary_platform(&member) else { continue };
            log::info!("Found binary for {platform}");
            binaries.push(BinaryInfo { platform, member, zip_index });
        }
        if binaries.is_empty() {
            return Err(PackageError::NoBinaries);
        }
        Ok(Self { archive, binaries })
    }

    /// Binaries in zip directory order.
    pub fn binaries(&self) -> &[BinaryInfo] {
        &self.binaries
    }

    /// Decompress the binary at `index` (an index into [`Self::binaries`]).
    pub fn extract(&mut self, index: usize) -> Result<Vec<u8>, PackageError> {
        let info = self.binaries.get(index).ok_or(PackageError::UnknownBinary(index))?;
        let platform = info.platform.clone();
        let mut file = self.archive.by_index(info.zip_index)?;
        let mut bytes = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut bytes)
            .map_err(|source| PackageError::Extract { platform, source })?;
        Ok(bytes)
    }
}

/// Platform of a package member if it is an app binary.
///
/// The platform is the path segment right before the file name; a binary at
/// the package root belongs to [`DEFAULT_PLATFORM`].
pub fn binary_platform(member: &str) -> Option<String> {
    let dir = member.strip_suffix(APP_BINARY_NAME)?;
    if dir.is_empty() {
        return Some(DEFAULT_PLATFORM.to_string());
    }
    // "basalt/" -> "basalt"; anything else glued to the file name is not ours.
    let dir = dir.strip_suffix('/')?;
    let platform = dir.rsplit('/').next().unwrap_or(dir);
    if platform.is_empty() {
        return Some(DEFAULT_PLATFORM.to_string());
    }
    Some(platform.to_string())
}
