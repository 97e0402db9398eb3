//! Command-line parsing for the daily-report series builder.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the aggregation code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::data::DEFAULT_BASE_URL;
use crate::domain::Metric;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "covid", version, about = "COVID-19 daily report time-series builder (JHU CSSE)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build per-state series (plus the two cruise ships and point sites).
    Us(RunArgs),
    /// Build per-country series.
    World(RunArgs),
}

/// Options shared by both scopes.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Read `MM-DD-YYYY.csv` reports from this directory instead of fetching.
    #[arg(long, env = "COVID_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the daily reports archive.
    #[arg(long, env = "COVID_REPORTS_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Also save every fetched report into this directory.
    #[arg(long, env = "COVID_MIRROR_DIR", value_name = "DIR")]
    pub mirror_dir: Option<PathBuf>,

    /// Last report date to include (YYYY-MM-DD). Defaults to today / the latest local file.
    #[arg(long, value_name = "DATE")]
    pub until: Option<NaiveDate>,

    /// Clamp negative daily changes (downward revisions) to zero.
    #[arg(long)]
    pub floor_negative: bool,

    /// Fail when a location has no population on record instead of storing 0.
    #[arg(long)]
    pub strict_population: bool,

    /// Compute daily deaths (always on for `world`).
    #[arg(long)]
    pub daily_deaths: bool,

    /// Skip the site-level store (`us` only).
    #[arg(long)]
    pub no_sites: bool,

    /// Metric to rank locations by on the latest date.
    #[arg(long, value_enum, default_value_t = Metric::Confirmed)]
    pub metric: Metric,

    /// Show the top-N locations.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Leave a location out of the ranking and total (repeatable).
    #[arg(long, value_name = "LOCATION")]
    pub exclude: Vec<String>,

    /// Export the series to long-format CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the series (and sites) to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_world_run_with_options() {
        let cli = Cli::try_parse_from([
            "covid",
            "world",
            "--data-dir",
            "reports",
            "--until",
            "2020-04-01",
            "--floor-negative",
            "--metric",
            "confirmed_normalized",
            "--exclude",
            "Mainland China",
            "--exclude",
            "others",
        ])
        .unwrap();

        let Command::World(args) = cli.command else {
            panic!("expected world subcommand");
        };
        assert_eq!(args.data_dir, Some(PathBuf::from("reports")));
        assert_eq!(args.until, NaiveDate::from_ymd_opt(2020, 4, 1));
        assert!(args.floor_negative);
        assert_eq!(args.metric, Metric::ConfirmedNormalized);
        assert_eq!(args.exclude, vec!["Mainland China".to_string(), "others".to_string()]);
        assert_eq!(args.top, 10);
    }

    #[test]
    fn rejects_unknown_metric() {
        assert!(Cli::try_parse_from(["covid", "us", "--metric", "recoveries"]).is_err());
    }
}
