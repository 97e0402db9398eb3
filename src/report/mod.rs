//! Reporting utilities: per-date rankings and formatted terminal output.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::NaiveDate;

use crate::domain::{LocationKey, Metric};
use crate::error::AppError;
use crate::series::SeriesStore;

pub mod format;

pub use format::{format_rankings, format_run_summary};

/// One location's value for the ranked metric.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedLocation {
    pub key: LocationKey,
    pub value: f64,
}

/// Top-N locations for one metric on one date, plus the scope total.
#[derive(Debug, Clone)]
pub struct Rankings {
    pub metric: Metric,
    pub date: NaiveDate,
    pub rows: Vec<RankedLocation>,
    /// Sum over every non-excluded location (not just the top N).
    pub total: f64,
}

/// Rank locations by `metric` at `date_idx`, largest first.
///
/// Undefined values sort last; excluded keys are neither ranked nor totalled.
pub fn rank_locations(
    store: &SeriesStore,
    metric: Metric,
    date_idx: usize,
    top_n: usize,
    exclude: &HashSet<LocationKey>,
) -> Result<Rankings, AppError> {
    let date = store.dates().get(date_idx).ok_or_else(|| {
        AppError::new(
            2,
            format!("Date position {date_idx} is outside the index ({} dates).", store.dates().len()),
        )
    })?;

    let mut rows: Vec<RankedLocation> = store
        .iter()
        .filter(|(key, _)| !exclude.contains(*key))
        .map(|(key, series)| RankedLocation {
            key: key.clone(),
            value: series.value(metric, date_idx),
        })
        .collect();
    rows.sort_by(|a, b| compare_desc_nan_last(a.value, b.value));
    rows.truncate(top_n);

    Ok(Rankings {
        metric,
        date,
        rows,
        total: store.total(metric, date_idx, exclude),
    })
}

fn compare_desc_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CorrectionTable, ReferenceTables};
    use crate::domain::{Counts, PipelineConfig, RawRow, Scope, SourceMode};
    use crate::io::ingest::ParsedReport;
    use crate::series::{DateIndex, SeriesBuilder};

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, m, d).unwrap()
    }

    fn world_store() -> SeriesStore {
        let tables = ReferenceTables::builtin();
        let corrections = CorrectionTable::empty();
        let config = PipelineConfig::for_scope(Scope::World, SourceMode::Local { dir: "unused".into() });
        let dates = DateIndex::from_dates([day(3, 1), day(3, 2)]);
        let mut builder = SeriesBuilder::new(&config, dates, &tables, &corrections).unwrap();

        let days = [
            (day(3, 1), vec![("Italy", 1694), ("Iran", 978), ("Mainland China", 79_968)]),
            (day(3, 2), vec![("Italy", 2036), ("Iran", 1501), ("Mainland China", 80_174)]),
        ];
        for (date, rows) in days {
            let rows: Vec<(usize, RawRow)> = rows
                .into_iter()
                .enumerate()
                .map(|(i, (country, confirmed))| (i + 2, RawRow::new(country, "", Counts::new(confirmed, 0, 0))))
                .collect();
            builder
                .ingest(ParsedReport {
                    date,
                    rows_read: rows.len(),
                    rows,
                    issues: Vec::new(),
                })
                .unwrap();
        }
        builder.finish().store
    }

    fn keys(r: &Rankings) -> Vec<&str> {
        r.rows.iter().map(|row| row.key.as_str()).collect()
    }

    #[test]
    fn ranks_descending_and_totals_everything_not_excluded() {
        let store = world_store();
        let rankings = rank_locations(&store, Metric::Daily, 1, 2, &HashSet::new()).unwrap();

        assert_eq!(rankings.date, day(3, 2));
        assert_eq!(keys(&rankings), vec!["iran", "italy"]);
        assert_eq!(rankings.total, 523.0 + 342.0 + 206.0);
    }

    #[test]
    fn exclusions_drop_from_rows_and_total() {
        let store = world_store();
        let exclude: HashSet<LocationKey> = [LocationKey::new("mainland china")].into_iter().collect();
        let rankings = rank_locations(&store, Metric::Confirmed, 1, 10, &exclude).unwrap();

        assert_eq!(keys(&rankings), vec!["italy", "iran"]);
        assert_eq!(rankings.total, 3537.0);
    }

    #[test]
    fn undefined_values_sort_last() {
        let store = world_store();
        let rankings = rank_locations(&store, Metric::Daily, 0, 10, &HashSet::new()).unwrap();
        assert!(rankings.rows.iter().all(|r| r.value.is_nan()));
        assert!(rankings.total.is_nan());

        let mut values = vec![1.0, f64::NAN, 3.0];
        values.sort_by(|a, b| compare_desc_nan_last(*a, *b));
        assert_eq!(values[..2], [3.0, 1.0]);
        assert!(values[2].is_nan());
    }

    #[test]
    fn out_of_range_position_is_an_input_error() {
        let store = world_store();
        let err = rank_locations(&store, Metric::Confirmed, 5, 10, &HashSet::new()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
