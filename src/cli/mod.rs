pub mod config;
pub mod dashboard;
pub mod export;
pub mod report;
pub mod rfm;
pub mod status;
pub mod years;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::error::Result;
use crate::loader::load_orders;
use crate::models::{OrderTable, YearFilter};
use crate::settings::{load_settings, shellexpand_path, Settings};

#[derive(Parser)]
#[command(
    name = "ecomdash",
    version,
    about = "Dashboard, order trends, and RFM analysis for e-commerce order data."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Dataset selection shared by every data command.
#[derive(Args, Clone, Default)]
pub struct DataArgs {
    /// Path to the order CSV (default: `data_path` from settings)
    #[arg(long = "data")]
    pub data: Option<String>,
}

impl DataArgs {
    pub fn resolve(&self, settings: &Settings) -> PathBuf {
        match &self.data {
            Some(p) => PathBuf::from(shellexpand_path(p)),
            None => settings.data_path(),
        }
    }

    /// Load settings and the order table in one step.
    pub fn load(&self) -> Result<(Settings, OrderTable)> {
        let settings = load_settings();
        let table = load_orders(&self.resolve(&settings))?;
        Ok((settings, table))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive dashboard (default).
    View {
        #[command(flatten)]
        data: DataArgs,
        /// Initial year selection: "all" or YYYY
        #[arg(long, default_value = "all")]
        year: YearFilter,
    },
    /// Print the dashboard as plain text tables.
    Report {
        #[command(flatten)]
        data: DataArgs,
        /// Year filter: "all" or YYYY
        #[arg(long, default_value = "all")]
        year: YearFilter,
    },
    /// Print the per-customer RFM table.
    Rfm {
        #[command(flatten)]
        data: DataArgs,
        /// Sort column (descending)
        #[arg(long, value_enum)]
        sort: Option<RfmSort>,
        /// Show at most N customers
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List the year filter options present in the dataset.
    Years {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Export the dashboard data as JSON.
    Export {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long, default_value = "all")]
        year: YearFilter,
        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show or update settings.
    Config {
        /// Default order CSV path
        #[arg(long = "data-path")]
        data_path: Option<String>,
        /// Text banner for the dashboard sidebar ("" to clear)
        #[arg(long = "banner-path")]
        banner_path: Option<String>,
        /// Bin count for the RFM histograms
        #[arg(long)]
        bins: Option<usize>,
    },
    /// Show settings location and dataset summary.
    Status {
        #[command(flatten)]
        data: DataArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RfmSort {
    Recency,
    Frequency,
    Monetary,
}
