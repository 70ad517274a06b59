//! # Command Line Interface
//!
//! Commands print JSON to stdout; logs go to stderr.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use telemetry_engine::{SortDirection, SortKey, SortOrder};

use crate::config::ServiceConfig;

/// Synthetic IoT telemetry service
#[derive(Parser, Debug)]
#[command(name = "telemetry-service", version)]
#[command(about = "Simulated device telemetry: snapshots, KPIs, chart series and live streams")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Fixed RNG seed for a replayable run
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, pretty, compact)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Stream payloads as JSON lines until interrupted
    Run {
        /// Delay between payloads in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Stop after this many payloads
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Advance every device once and print the snapshots
    Snapshot {
        /// Column to order the table by
        #[arg(long, value_enum, default_value = "id")]
        sort: SortColumn,

        /// Order descending instead of ascending
        #[arg(long)]
        descending: bool,
    },
    /// Print a KPI summary
    Kpi,
    /// Print a chart time series
    Series {
        /// Number of intervals in the window
        #[arg(long, default_value_t = 24)]
        window: usize,

        /// Hours between points
        #[arg(long, default_value_t = 1.0)]
        interval_hours: f64,
    },
    /// Print the device catalog
    Catalog,
}

/// Device table column
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Name,
    Status,
    Value,
    LastUpdate,
}

impl From<SortColumn> for SortKey {
    fn from(column: SortColumn) -> Self {
        match column {
            SortColumn::Id => SortKey::Id,
            SortColumn::Name => SortKey::Name,
            SortColumn::Status => SortKey::Status,
            SortColumn::Value => SortKey::Value,
            SortColumn::LastUpdate => SortKey::LastUpdate,
        }
    }
}

/// Table ordering requested on the command line
pub fn sort_order(column: SortColumn, descending: bool) -> SortOrder {
    let direction = if descending { SortDirection::Descending } else { SortDirection::Ascending };
    SortOrder::new(column.into(), direction)
}

impl Cli {
    /// Apply command-line overrides, which win over file and environment
    pub fn apply_overrides(&self, config: &mut ServiceConfig) {
        if let Some(seed) = self.seed {
            config.simulation.seed = Some(seed);
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
        if let Commands::Run { interval_ms: Some(interval_ms), .. } = self.command {
            config.stream.interval_ms = interval_ms;
        }
    }
}
