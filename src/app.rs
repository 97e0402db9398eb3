//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - sets up logging and loads `.env`
//! - parses CLI arguments
//! - builds the series for the requested scope
//! - prints the run summary and rankings
//! - writes optional exports

use std::collections::HashSet;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::{Command, RunArgs};
use crate::domain::{LocationKey, NegativeDaily, PipelineConfig, PopulationPolicy, Scope, SourceMode};
use crate::error::AppError;

pub mod cache;
pub mod pipeline;

pub use cache::SeriesCache;

/// Entry point for the `covid` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Us(args) => handle_run(Scope::Us, &args),
        Command::World(args) => handle_run(Scope::World, &args),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("covid_series=info"));
    // Keep a subscriber that is already installed.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn handle_run(scope: Scope, args: &RunArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(scope, args);
    let built = pipeline::run_pipeline(&config)?;

    print!("{}", crate::report::format_run_summary(&built, &config));

    let exclude: HashSet<LocationKey> = args.exclude.iter().map(|s| LocationKey::new(s)).collect();
    let latest = built.store.dates().len().saturating_sub(1);
    let rankings = crate::report::rank_locations(&built.store, args.metric, latest, args.top, &exclude)?;
    print!("{}", crate::report::format_rankings(&rankings));

    // Optional exports.
    if let Some(path) = &args.export {
        crate::io::export::write_series_csv(path, &built.store)?;
        tracing::info!(path = %path.display(), "wrote CSV export");
    }
    if let Some(path) = &args.export_json {
        crate::io::export::write_series_json(path, &built.store, built.sites.as_ref())?;
        tracing::info!(path = %path.display(), "wrote JSON export");
    }

    Ok(())
}

pub fn pipeline_config_from_args(scope: Scope, args: &RunArgs) -> PipelineConfig {
    let source = match &args.data_dir {
        Some(dir) => SourceMode::Local { dir: dir.clone() },
        None => SourceMode::Remote {
            base_url: args.base_url.clone(),
            mirror_dir: args.mirror_dir.clone(),
        },
    };

    let mut config = PipelineConfig::for_scope(scope, source);
    config.end_date = args.until;
    if args.floor_negative {
        config.negative_daily = NegativeDaily::Floor;
    }
    if args.strict_population {
        config.population_policy = PopulationPolicy::Strict;
    }
    config.daily_deaths |= args.daily_deaths;
    config.site_level &= !args.no_sites;
    config
}
