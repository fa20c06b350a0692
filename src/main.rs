mod cli;
mod error;
mod fmt;
mod loader;
mod models;
mod reports;
mod rfm;
mod settings;
mod tui;

use std::io::IsTerminal;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands, DataArgs};
use models::YearFilter;

/// Log to stderr, filtered by ECOMDASH_LOG (default "warn").
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("ECOMDASH_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::View {
        data: DataArgs::default(),
        year: YearFilter::All,
    });

    let result = match command {
        Commands::View { data, year } => {
            if std::io::stdout().is_terminal() {
                cli::dashboard::run(&data, year)
            } else {
                cli::report::run(&data, year)
            }
        }
        Commands::Report { data, year } => cli::report::run(&data, year),
        Commands::Rfm { data, sort, limit } => cli::rfm::run(&data, sort, limit),
        Commands::Years { data } => cli::years::run(&data),
        Commands::Export { data, year, output } => cli::export::run(&data, year, output),
        Commands::Config {
            data_path,
            banner_path,
            bins,
        } => cli::config::run(data_path, banner_path, bins),
        Commands::Status { data } => cli::status::run(&data),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
