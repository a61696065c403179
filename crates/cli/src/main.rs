use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pbw_api_info::commands::{
    binaries_command, functions_command, members_command, scan_command, ConfigOverrides,
};
use pbw_api_info::{init_logging, parse_lib_path};

/// Report which Pebble SDK API functions a compiled watch app references.
///
/// This CLI is a thin wrapper around `pbw-api-core` (exposed in code as
/// `pbw_api_core`). All substantive logic lives in the library so it can be
/// tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "pbw-api-info",
    version,
    about = "Report which Pebble SDK APIs a .pbw app uses",
    long_about = None
)]
struct Cli {
    /// Log debug output to stderr. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan every binary of a `.pbw` package against the SDK import libraries.
    ///
    /// Writes a JSON report to OUTPUT, or to stdout. Exits non-zero if any
    /// platform failed (or, with `--single-failures`, if every platform failed).
    Scan {
        /// Path to the `.pbw` package.
        input: PathBuf,

        /// Where to write the JSON report. Defaults to stdout.
        output: Option<PathBuf>,

        /// JSON or YAML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// SDK core directory holding `pebble/<platform>/lib/libpebble.a`.
        #[arg(long)]
        sdkroot: Option<String>,

        /// Import library override for one platform. Repeatable.
        #[arg(long = "libpath", value_name = "PLATFORM=PATH", value_parser = parse_lib_path)]
        lib_paths: Vec<(String, String)>,

        /// Only fail when no platform could be scanned.
        #[arg(long, default_value_t = false)]
        single_failures: bool,
    },

    /// List the members of an `ar` archive (name, size, data offset).
    Members {
        /// Path to the archive, e.g. `libpebble.a`.
        archive: PathBuf,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List the API functions an import library provides.
    Functions {
        /// Path to the import library.
        archive: PathBuf,

        /// Platform label used in output and logs.
        #[arg(long)]
        platform: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List the app binaries inside a `.pbw` package.
    Binaries {
        /// Path to the `.pbw` package.
        input: PathBuf,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Scan { input, output, config, sdkroot, lib_paths, single_failures } => {
            let overrides =
                ConfigOverrides { config, sdk_root: sdkroot, lib_paths, single_failures };
            scan_command(&input, output.as_deref(), &overrides)?
        }
        Command::Members { archive, json } => members_command(&archive, json)?,
        Command::Functions { archive, platform, json } => {
            functions_command(&archive, platform.as_deref(), json)?
        }
        Command::Binaries { input, json } => binaries_command(&input, json)?,
    }

    Ok(())
}
