//! Date-by-date construction of a `SeriesStore`.
//!
//! The builder owns the store while it is mutable. Dates must be fed in
//! increasing order: `daily` at date `i` reads the finalized counts at `i - 1`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::data::{CorrectionTable, ReferenceTables};
use crate::domain::{LocationKey, PipelineConfig, Scope};
use crate::error::{AppError, SeriesError};
use crate::io::ingest::{IssueKind, ParsedReport, RowIssue};
use crate::location::LocationNormalizer;
use crate::series::aggregate::RowAggregator;
use crate::series::date_index::DateIndex;
use crate::series::derived::{DerivedCalculator, DerivedOptions};
use crate::series::sites::SiteStore;
use crate::series::store::SeriesStore;

/// Row- and date-level anomalies collected over a run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub rows_read: usize,
    pub rows_used: usize,
    pub issues: Vec<RowIssue>,
    pub corrections_applied: Vec<(NaiveDate, LocationKey)>,
    /// Dates left out of the index because their snapshot could not be fetched or parsed.
    pub skipped_dates: Vec<(NaiveDate, String)>,
}

impl Diagnostics {
    pub fn malformed_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| matches!(i.kind, IssueKind::Malformed(_)))
            .count()
    }

    pub fn unresolved_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.kind == IssueKind::Unresolved)
            .count()
    }

    /// Unresolved raw locations and how often each was dropped.
    pub fn unresolved_locations(&self) -> BTreeMap<&str, usize> {
        let mut out = BTreeMap::new();
        for issue in self.issues.iter().filter(|i| i.kind == IssueKind::Unresolved) {
            *out.entry(issue.location.as_str()).or_insert(0) += 1;
        }
        out
    }
}

/// Completed, read-only pipeline output.
#[derive(Debug, Clone)]
pub struct BuiltSeries {
    pub store: SeriesStore,
    pub sites: Option<SiteStore>,
    pub diagnostics: Diagnostics,
}

pub struct SeriesBuilder<'a> {
    aggregator: RowAggregator<'a>,
    derived: DerivedCalculator<'a>,
    store: SeriesStore,
    sites: Option<SiteStore>,
    diagnostics: Diagnostics,
    last_date: Option<NaiveDate>,
}

impl<'a> SeriesBuilder<'a> {
    pub fn new(
        config: &PipelineConfig,
        dates: DateIndex,
        tables: &'a ReferenceTables,
        corrections: &'a CorrectionTable,
    ) -> Result<Self, SeriesError> {
        let scope = config.scope;
        let aggregator = RowAggregator::new(scope, LocationNormalizer::new(scope, tables), corrections);
        let derived = DerivedCalculator::new(
            scope,
            tables,
            corrections,
            DerivedOptions {
                negative_daily: config.negative_daily,
                daily_deaths: config.daily_deaths,
                population_policy: config.population_policy,
            },
        );

        let sites = (config.site_level && scope == Scope::Us).then(|| SiteStore::new(dates.since(config.site_cutover)));

        let mut store = SeriesStore::new(scope, dates);
        if scope == Scope::Us {
            // Every state exists in the output, even one that never reports.
            for key in tables.us_keys() {
                store.ensure(&key);
                derived.population(&key)?;
            }
        }

        Ok(Self {
            aggregator,
            derived,
            store,
            sites,
            diagnostics: Diagnostics::default(),
            last_date: None,
        })
    }

    /// Accumulate one date's report and refresh derived metrics for that date.
    pub fn ingest(&mut self, report: ParsedReport) -> Result<(), AppError> {
        let date = report.date;
        if self.last_date.is_some_and(|last| date <= last) {
            return Err(AppError::new(
                4,
                format!("Reports must be ingested in increasing date order ({date} after {:?}).", self.last_date),
            ));
        }
        let idx = self.store.dates().index_of(date)?;

        self.diagnostics.rows_read += report.rows_read;
        self.diagnostics.issues.extend(report.issues);

        let outcome = self
            .aggregator
            .accumulate(&report.rows, date, &mut self.store, self.sites.as_mut())?;

        self.diagnostics.rows_used += outcome.rows_used;
        self.diagnostics.issues.extend(outcome.issues);
        self.diagnostics
            .corrections_applied
            .extend(outcome.corrections_applied.into_iter().map(|k| (date, k)));

        let keys: Vec<LocationKey> = self.store.keys().cloned().collect();
        for key in &keys {
            if outcome.new_keys.contains(key) {
                self.derived.backfill(&mut self.store, key, idx)?;
            } else {
                self.derived.update_derived(&mut self.store, key, idx)?;
            }
        }

        debug!(%date, idx, rows = outcome.rows_used, locations = keys.len(), "date accumulated");
        self.last_date = Some(date);
        Ok(())
    }

    /// Note a date whose snapshot could not be used; it is not part of the index.
    pub fn note_skipped(&mut self, date: NaiveDate, reason: String) {
        self.diagnostics.skipped_dates.push((date, reason));
    }

    /// Remove a date that is still ahead of the ingest cursor from the index,
    /// e.g. when its snapshot was listed but could not be fetched or parsed.
    pub fn drop_date(&mut self, date: NaiveDate, reason: String) -> Result<(), AppError> {
        if self.last_date.is_some_and(|last| date <= last) {
            return Err(AppError::new(4, format!("Cannot drop {date}: it has already been ingested.")));
        }
        self.store.remove_date(date)?;
        if let Some(sites) = self.sites.as_mut() {
            sites.remove_date(date);
        }
        debug!(%date, remaining = self.store.dates().len(), "date dropped from index");
        self.note_skipped(date, reason);
        Ok(())
    }

    pub fn finish(self) -> BuiltSeries {
        BuiltSeries {
            store: self.store,
            sites: self.sites,
            diagnostics: self.diagnostics,
        }
    }
}
