//! Shared pipeline logic used by every front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! check availability -> date index -> fetch + parse + accumulate date by date
//!
//! Availability checks and fetches run in parallel. Parsed rows are only held
//! for one bounded chunk of dates at a time, and accumulation is strictly
//! sequential in date order.

use std::collections::HashSet;

use chrono::{Local, NaiveDate};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::data::{CorrectionTable, CsseClient, LocalDir, ReferenceTables, ReportSource};
use crate::domain::{PipelineConfig, Scope, SourceMode};
use crate::error::AppError;
use crate::io::ingest::{ParsedReport, parse_daily_report};
use crate::series::date_index::day_range;
use crate::series::{BuiltSeries, DateIndex, SeriesBuilder};

/// Dates fetched and parsed together before being ingested and dropped.
const FETCH_CHUNK: usize = 16;

/// Build the report source described by the config.
pub fn source_for(config: &PipelineConfig) -> Box<dyn ReportSource> {
    match &config.source {
        SourceMode::Remote { base_url, mirror_dir } => {
            let client = CsseClient::new(base_url.clone());
            match mirror_dir {
                Some(dir) => Box::new(client.with_mirror(dir.clone())),
                None => Box::new(client),
            }
        }
        SourceMode::Local { dir } => Box::new(LocalDir::new(dir.clone())),
    }
}

/// Execute the full pipeline against the configured source, up to today.
pub fn run_pipeline(config: &PipelineConfig) -> Result<BuiltSeries, AppError> {
    let source = source_for(config);
    Pipeline::new(config).run(source.as_ref(), Local::now().date_naive())
}

/// One configured pipeline run: config plus the static tables it consults.
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    tables: ReferenceTables,
    corrections: CorrectionTable,
}

impl<'a> Pipeline<'a> {
    /// Pipeline with the built-in reference tables and overlays for the scope.
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self {
            config,
            tables: ReferenceTables::builtin(),
            corrections: CorrectionTable::builtin(config.scope),
        }
    }

    /// Replace the reference tables.
    pub fn with_tables(mut self, tables: ReferenceTables) -> Self {
        self.tables = tables;
        self
    }

    /// Replace the overlay table (the built-ins are dropped).
    pub fn with_corrections(mut self, corrections: CorrectionTable) -> Self {
        self.corrections = corrections;
        self
    }

    /// Run against `source`, treating `today` as the latest possible report date.
    pub fn run(&self, source: &dyn ReportSource, today: NaiveDate) -> Result<BuiltSeries, AppError> {
        let config = self.config;
        let start = config.start_date;
        let end = config.end_date.unwrap_or_else(|| source.end_date(today));
        if end < start {
            return Err(AppError::new(2, format!("End date {end} is before start date {start}.")));
        }

        info!(scope = ?config.scope, source = %source.describe(), %start, %end, "loading daily reports");

        // 1) Check which dates have a snapshot. Nothing is kept but the answer.
        let candidates: Vec<NaiveDate> = day_range(start, end).collect();
        let checked: Vec<(NaiveDate, Result<bool, AppError>)> = candidates
            .par_iter()
            .map(|&date| (date, source.available(date)))
            .collect();

        let mut available = HashSet::new();
        let mut skipped = Vec::new();
        for (date, result) in checked {
            match result {
                Ok(true) => {
                    available.insert(date);
                }
                Ok(false) => debug!(%date, "no snapshot; date excluded"),
                Err(e) => {
                    warn!(%date, error = %e, "availability check failed; date excluded");
                    skipped.push((date, e.to_string()));
                }
            }
        }

        // 2) Date index over the dates that have a snapshot.
        let dates = DateIndex::build(start, end, |date| available.contains(&date));
        if dates.is_empty() {
            return Err(no_reports(start, end, source));
        }
        let indexed = dates.dates().to_vec();

        // 3) Fetch + parse a chunk in parallel, ingest it in date order, drop it.
        let mut builder = SeriesBuilder::new(config, dates, &self.tables, &self.corrections)?;
        for (date, reason) in skipped {
            builder.note_skipped(date, reason);
        }
        for chunk in indexed.chunks(FETCH_CHUNK) {
            let reports: Vec<(NaiveDate, Result<Option<ParsedReport>, AppError>)> = chunk
                .par_iter()
                .map(|&date| (date, fetch_report(source, date, config.scope)))
                .collect();

            for (date, result) in reports {
                match result {
                    Ok(Some(report)) => builder.ingest(report)?,
                    Ok(None) => {
                        warn!(%date, "snapshot vanished after the availability check; date excluded");
                        builder.drop_date(date, "snapshot vanished after the availability check".to_string())?;
                    }
                    Err(e) => {
                        warn!(%date, error = %e, "snapshot unusable; date excluded");
                        builder.drop_date(date, e.to_string())?;
                    }
                }
            }
        }

        let built = builder.finish();
        if built.store.dates().is_empty() {
            return Err(no_reports(start, end, source));
        }
        info!(
            dates = built.store.dates().len(),
            locations = built.store.len(),
            rows_used = built.diagnostics.rows_used,
            malformed = built.diagnostics.malformed_count(),
            unresolved = built.diagnostics.unresolved_count(),
            "series built"
        );
        Ok(built)
    }
}

fn fetch_report(source: &dyn ReportSource, date: NaiveDate, scope: Scope) -> Result<Option<ParsedReport>, AppError> {
    source
        .fetch(date)?
        .map(|text| parse_daily_report(&text, date, scope))
        .transpose()
}

fn no_reports(start: NaiveDate, end: NaiveDate, source: &dyn ReportSource) -> AppError {
    AppError::new(
        3,
        format!("No daily reports available between {start} and {end} from {}.", source.describe()),
    )
}
