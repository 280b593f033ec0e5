//! CLI subcommand definitions and handlers.
//!
//! Uses clap derive to define the subcommand hierarchy:
//! - `enrich [PAYLOAD]` -- run one push payload through the pipeline
//! - `config show|path|schema` -- inspect configuration
//! - `version` -- print build/version info

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tokio::io::AsyncReadExt;

use crate::config::{self, Config, ConfigError};
use crate::notification::{EnrichmentPipeline, NotificationContent};

/// Notification service extension: enrich push payloads with media attachments.
#[derive(Parser, Debug)]
#[command(
    name = "notifex",
    version = env!("CARGO_PKG_VERSION"),
    about = "notifex: enrich push notifications with fetched media attachments"
)]
pub struct Cli {
    /// Config file (default: $NOTIFEX_CONFIG_PATH or the user config dir).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enrich a push payload and print the resulting content as JSON.
    Enrich(EnrichArgs),

    /// Inspect configuration.
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Print version, build date, and git commit information.
    Version,
}

#[derive(Args, Debug, Default, PartialEq)]
pub struct EnrichArgs {
    /// Payload JSON file; reads stdin when omitted or `-`.
    pub payload: Option<PathBuf>,

    /// Time budget in milliseconds (overrides `enrichment.deadlineMs`).
    #[arg(long)]
    pub deadline_ms: Option<u64>,

    /// Attachment root directory (overrides `media.tempDir`).
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,

    /// Title suffix (overrides `enrichment.titleSuffix`).
    #[arg(long)]
    pub title_suffix: Option<String>,
}

impl EnrichArgs {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(ms) = self.deadline_ms {
            config.enrichment.deadline_ms = ms;
        }
        if let Some(dir) = &self.temp_dir {
            config.media.temp_dir = Some(dir.clone());
        }
        if let Some(suffix) = &self.title_suffix {
            config.enrichment.title_suffix = suffix.clone();
        }
    }
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigCommand {
    /// Print the fully loaded configuration as JSON.
    Show,

    /// Print the resolved configuration file path.
    Path,

    /// Print the JSON schema of the configuration file.
    Schema,
}

// ---------------------------------------------------------------------------
// Subcommand handlers
// ---------------------------------------------------------------------------

/// Load config from `explicit` when given, otherwise from the default path.
pub fn resolve_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    match explicit {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    }
}

/// Run the `enrich` subcommand.
pub async fn handle_enrich(
    config: &Config,
    payload: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = read_payload(payload).await?;
    let content = enrich_payload(config, &raw).await?;
    println!("{}", serde_json::to_string_pretty(&content)?);
    Ok(())
}

/// Decode `raw` and run it through a pipeline built from `config`.
pub async fn enrich_payload(
    config: &Config,
    raw: &str,
) -> Result<NotificationContent, Box<dyn std::error::Error>> {
    let original = NotificationContent::from_payload_str(raw)?;
    let pipeline = EnrichmentPipeline::from_config(config)?;
    Ok(pipeline
        .enrich(&original, config.enrichment.deadline())
        .await)
}

async fn read_payload(path: Option<&Path>) -> std::io::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path).await,
        _ => {
            let mut raw = String::new();
            tokio::io::stdin().read_to_string(&mut raw).await?;
            Ok(raw)
        }
    }
}

/// Run the `config show` subcommand.
pub fn handle_config_show(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

/// Run the `config path` subcommand.
pub fn handle_config_path(explicit: Option<&Path>) {
    match explicit {
        Some(path) => println!("{}", path.display()),
        None => println!("{}", config::get_config_path().display()),
    }
}

/// Run the `config schema` subcommand.
pub fn handle_config_schema() -> Result<(), Box<dyn std::error::Error>> {
    let schema = config::schema::generate_config_schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

/// Run the `version` subcommand.
pub fn handle_version() {
    println!("notifex {}", env!("CARGO_PKG_VERSION"));
    println!("  Build date: {}", env!("NOTIFEX_BUILD_DATE"));
    println!("  Git commit: {}", env!("NOTIFEX_GIT_HASH"));
    println!(
        "  Platform:   {} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}
