//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::device::DeviceIdStore;
use crate::errors::Result;
use crate::region::RegionDirectory;

/// otacheck CLI: query OTA update servers.
#[derive(Parser)]
#[command(
    name = "otacheck",
    about = "Query OTA update servers over their encrypted envelope protocol",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ./.otacheck.toml if present)
    #[arg(long, env = "OTACHECK_CONFIG", global = true)]
    pub config: Option<String>,

    /// Log filter: error, warn, info, debug, trace, or a tracing directive
    #[arg(long, env = "OTACHECK_LOG", default_value = "warn", global = true)]
    pub log_level: String,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Ask the update server whether a newer build exists
    Query {
        /// Current OTA version (e.g. PHB110_11.F.13_2130_202403061922)
        ota_version: String,

        /// Region code: CN, EU, IN, SG, RU, TR, TH, GL, ID, TW, MY, VN
        #[arg(short, long, default_value = "")]
        region: String,

        /// Device model (derived from the OTA version if omitted)
        #[arg(short, long, default_value = "")]
        model: String,

        /// Carrier id override (region default if omitted)
        #[arg(long, default_value = "")]
        carrier: String,

        /// Update mode header
        #[arg(long, default_value = "0")]
        mode: String,

        /// IMEI to derive the device id from (stable random id if omitted)
        #[arg(long)]
        imei: Option<String>,

        /// Android version header
        #[arg(long, default_value = "")]
        android_version: String,

        /// ColorOS version header
        #[arg(long, default_value = "")]
        coloros_version: String,

        /// HTTP(S) or SOCKS5 proxy URL
        #[arg(long, env = "OTACHECK_PROXY")]
        proxy: Option<String>,

        /// Request timeout in seconds (overrides config)
        #[arg(long)]
        timeout: Option<u64>,

        /// Print the whole decrypted reply instead of just the body
        #[arg(long)]
        raw: bool,
    },

    /// List supported regions and their endpoints
    Regions,

    /// Show the device id a query would send
    DeviceId {
        /// IMEI to derive the id from
        #[arg(long)]
        imei: Option<String>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Install the stderr log subscriber.  Safe to call more than once.
pub fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Load settings from `--config`, or from the working directory.
///
/// Returns the settings and the directory relative paths resolve against.
pub fn load_settings(cli: &Cli) -> Result<(Settings, PathBuf)> {
    match &cli.config {
        Some(path) => {
            let path = PathBuf::from(path);
            let settings = Settings::load_from(&path)?;
            let base = path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            Ok((settings, base))
        }
        None => {
            let cwd = std::env::current_dir()?;
            let settings = Settings::load(&cwd)?;
            Ok((settings, cwd))
        }
    }
}

/// Build the region directory from the loaded settings.
pub fn region_directory(cli: &Cli) -> Result<(Settings, RegionDirectory)> {
    let (settings, base) = load_settings(cli)?;
    let directory = settings.region_directory(&base)?;
    Ok((settings, directory))
}

/// The device-id store configured in `settings`.
pub fn device_id_store(settings: &Settings) -> DeviceIdStore {
    DeviceIdStore::new(settings.device_id_path())
}
