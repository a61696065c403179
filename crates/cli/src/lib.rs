pub mod commands;

use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha256};

/// Install the global logger.
///
/// Defaults to errors only; `verbose` raises the level to debug. `RUST_LOG`
/// overrides both. Calling this more than once is harmless.
pub fn init_logging(verbose: bool) {
    let level = if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Error };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .try_init();
}

/// Parse a `PLATFORM=PATH` library override.
pub fn parse_lib_path(raw: &str) -> Result<(String, String)> {
    let (platform, path) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid library override '{raw}'. Expected PLATFORM=PATH"))?;
    let platform = platform.trim();
    if platform.is_empty() || path.is_empty() {
        return Err(anyhow!("Invalid library override '{raw}'. Expected PLATFORM=PATH"));
    }
    Ok((platform.to_string(), path.to_string()))
}

/// Compute the SHA-256 hash of a file and return it as a hex string.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open file for hashing: {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read file for hashing: {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    let digest = hasher.finalize();
    Ok(format!("{:x}", digest))
}
