//! Shared domain types.
//!
//! These types are intentionally small and serializable so they can be:
//!
//! - used in-memory while the series store is being built
//! - exported to JSON/CSV
//! - handed to rendering consumers once the store is complete

use std::fmt;
use std::ops::AddAssign;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// First date of the JHU CSSE daily report archive.
pub const EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(2020, 1, 22) {
    Some(d) => d,
    None => panic!("invalid epoch date"),
};

/// First date on which US reports carry site-level coordinates.
pub const SITE_CUTOVER: NaiveDate = match NaiveDate::from_ymd_opt(2020, 3, 1) {
    Some(d) => d,
    None => panic!("invalid site cutover date"),
};

/// Which aggregation the pipeline produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// US states and territories, plus the two cruise ships.
    Us,
    /// Countries, after alias resolution.
    World,
}

impl Scope {
    pub fn display_name(self) -> &'static str {
        match self {
            Scope::Us => "US states",
            Scope::World => "World",
        }
    }
}

/// Canonical lowercase identifier for a place.
///
/// Construction always trims and lowercases, so two spellings that differ only
/// in case or surrounding whitespace map to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationKey(String);

impl LocationKey {
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationKey {
    fn from(value: &str) -> Self {
        LocationKey::new(value)
    }
}

/// Cumulative counts carried by one report row (or a sum of rows).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub confirmed: i64,
    pub deaths: i64,
    pub recovered: i64,
}

impl Counts {
    pub fn new(confirmed: i64, deaths: i64, recovered: i64) -> Self {
        Self {
            confirmed,
            deaths,
            recovered,
        }
    }

    pub fn active(&self) -> i64 {
        self.confirmed - self.recovered - self.deaths
    }
}

impl AddAssign for Counts {
    fn add_assign(&mut self, rhs: Self) {
        self.confirmed += rhs.confirmed;
        self.deaths += rhs.deaths;
        self.recovered += rhs.recovered;
    }
}

/// One source record of a daily report.
///
/// Rows are transient: the aggregator consumes them and only the summed
/// counts survive in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub country: String,
    /// Free-text province/state column (may be empty for country-level rows).
    pub location: String,
    /// `Combined_Key` when the report provides one.
    pub combined_key: Option<String>,
    pub counts: Counts,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl RawRow {
    pub fn new(country: &str, location: &str, counts: Counts) -> Self {
        Self {
            country: country.to_string(),
            location: location.to_string(),
            combined_key: None,
            counts,
            latitude: None,
            longitude: None,
        }
    }

    /// Raw label used to key site-level entries.
    pub fn site_label(&self) -> &str {
        self.combined_key.as_deref().unwrap_or(&self.location)
    }

    /// Coordinates, if present and not the `0,0` fill value.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat != 0.0 || lon != 0.0 => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Metrics held per location and date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Metric {
    Confirmed,
    Deaths,
    Recovered,
    Active,
    Daily,
    DailyDeaths,
    ConfirmedNormalized,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Confirmed,
        Metric::Deaths,
        Metric::Recovered,
        Metric::Active,
        Metric::Daily,
        Metric::DailyDeaths,
        Metric::ConfirmedNormalized,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Confirmed => "confirmed",
            Metric::Deaths => "deaths",
            Metric::Recovered => "recovered",
            Metric::Active => "active",
            Metric::Daily => "daily",
            Metric::DailyDeaths => "daily_deaths",
            Metric::ConfirmedNormalized => "confirmed_normalized",
        }
    }
}

/// What to do with a negative first difference of a cumulative series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegativeDaily {
    /// Keep the downward revision as a negative value.
    Keep,
    /// Clamp negative values to zero.
    Floor,
}

/// How `confirmed_normalized` behaves for a location without a population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopulationPolicy {
    /// Store `0.0` for every date.
    Zero,
    /// Fail the run with `SeriesError::PopulationMissing`.
    Strict,
}

/// Where daily reports come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceMode {
    /// Fetch from a remote archive, optionally mirroring files to disk.
    Remote {
        base_url: String,
        mirror_dir: Option<PathBuf>,
    },
    /// Read `MM-DD-YYYY.csv` files from a local directory.
    Local { dir: PathBuf },
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub scope: Scope,
    pub source: SourceMode,
    pub start_date: NaiveDate,
    /// Last date to check; `None` lets the source decide (today / last file).
    pub end_date: Option<NaiveDate>,
    pub negative_daily: NegativeDaily,
    pub population_policy: PopulationPolicy,
    /// Compute `daily_deaths`; when off the series holds the undefined sentinel.
    pub daily_deaths: bool,
    /// Build the site-level sub-store (US scope only).
    pub site_level: bool,
    pub site_cutover: NaiveDate,
}

impl PipelineConfig {
    /// Defaults for a scope: world computes daily deaths, US builds sites.
    pub fn for_scope(scope: Scope, source: SourceMode) -> Self {
        Self {
            scope,
            source,
            start_date: EPOCH,
            end_date: None,
            negative_daily: NegativeDaily::Keep,
            population_policy: PopulationPolicy::Zero,
            daily_deaths: scope == Scope::World,
            site_level: scope == Scope::Us,
            site_cutover: SITE_CUTOVER,
        }
    }
}
