//! routegen: simulated trips between administrative zones, routed over a
//! road network and ranked by shared road segments.
//!
//! ```text
//! routegen -c run.json coordinates     OD csv + zones  → coordinates.json
//! routegen -c run.json routes          coordinates.json → routes_{n}_samples.json + error log
//! routegen -c run.json fixed-origins   fixed origins   → fixed_origins/{timestamp}.json
//! routegen -c run.json congestion      routes json     → congestion.json
//! ```

mod cli;
mod commands;
mod config;
mod layout;


use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Mode};
use config::RunConfig;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = RunConfig::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    config.validate(cli.mode).context("invalid configuration")?;
    log::info!("mode {} with config {}", cli.mode.as_str(), cli.config.display());

    match cli.mode {
        Mode::Coordinates => commands::coordinates::run(&config),
        Mode::Routes => commands::routes::run(&config),
        Mode::FixedOrigins => commands::fixed_origins::run(&config),
        Mode::Congestion => commands::congestion::run(&config),
    }
}
