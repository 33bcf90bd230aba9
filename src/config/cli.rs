use crate::config::toml_config::MapConfig;
use crate::core::Coordinate;
use crate::domain::model::SequencingPolicy;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "aqi-map")]
#[command(about = "Click-to-query air quality map for the terminal")]
pub struct CliConfig {
    /// AQI backend base URL (overrides the config file)
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds (no timeout by default)
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Drop answers that arrive after a newer click has already settled
    #[arg(long)]
    pub discard_stale: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the interactive map: every stdin line `lat,lon` is a click
    Run {
        /// Skip the fixed-coordinate startup query
        #[arg(long)]
        skip_startup: bool,
    },
    /// Query a single coordinate and print the popup
    Query {
        #[arg(allow_hyphen_values = true)]
        coordinate: Coordinate,
        /// Print the backend JSON as-is
        #[arg(long)]
        raw: bool,
    },
    /// Hourly PM2.5 forecast for a coordinate
    Forecast {
        #[arg(allow_hyphen_values = true)]
        coordinate: Coordinate,
        #[arg(long, default_value_t = crate::adapters::http::DEFAULT_FORECAST_HOURS)]
        hours: u32,
    },
    /// Ask the backend to generate and ingest synthetic observations
    Ingest,
    /// Ask the backend to retrain its models
    Train,
}

impl CliConfig {
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Run { skip_startup: false })
    }

    /// 讀取設定檔（若有），套用命令列覆蓋，最後驗證
    pub fn resolve(&self) -> Result<MapConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                MapConfig::from_file(path)?
            }
            None => MapConfig::default(),
        };

        if let Some(url) = &self.backend_url {
            config.backend.url = url.clone();
        }
        if let Some(timeout) = self.timeout_seconds {
            config.backend.timeout_seconds = Some(timeout);
        }
        if self.discard_stale {
            config.controller.sequencing = SequencingPolicy::DiscardStale;
        }

        config.validate()?;
        Ok(config)
    }
}
