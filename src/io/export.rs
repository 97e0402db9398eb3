//! Export the finished series to CSV or JSON.
//!
//! The exports are meant to be easy to consume in spreadsheets, notebooks, or
//! the chart/map renderers that sit downstream of this crate.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::domain::Metric;
use crate::error::AppError;
use crate::series::{SeriesStore, SiteStore};

/// Write a long-format CSV: one line per `(date, location)`.
///
/// Undefined values (`NaN`) are written as empty fields.
pub fn write_series_csv(path: &Path, store: &SeriesStore) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);

    let mut header = vec!["date", "location"];
    header.extend(Metric::ALL.iter().map(|m| m.name()));
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for (idx, date) in store.dates().dates().iter().enumerate() {
        for (key, series) in store.iter() {
            let mut record = vec![date.to_string(), key.to_string()];
            record.extend(Metric::ALL.iter().map(|m| format_value(*m, series.value(*m, idx))));
            writer
                .write_record(&record)
                .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
        }
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

fn format_value(metric: Metric, value: f64) -> String {
    if value.is_nan() {
        return String::new();
    }
    match metric {
        Metric::ConfirmedNormalized => format!("{value:.6}"),
        _ => format!("{value:.0}"),
    }
}

#[derive(Serialize)]
struct SeriesFile<'a> {
    tool: &'static str,
    store: &'a SeriesStore,
    #[serde(skip_serializing_if = "Option::is_none")]
    sites: Option<&'a SiteStore>,
}

/// Write the full store (and site store, if any) as JSON. `NaN` becomes `null`.
pub fn write_series_json(path: &Path, store: &SeriesStore, sites: Option<&SiteStore>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export JSON '{}': {e}", path.display())))?;

    let out = SeriesFile {
        tool: "covid",
        store,
        sites,
    };
    serde_json::to_writer_pretty(file, &out)
        .map_err(|e| AppError::new(2, format!("Failed to write export JSON: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::data::{CorrectionTable, ReferenceTables};
    use crate::domain::{Counts, LocationKey, PipelineConfig, RawRow, Scope, SourceMode};
    use crate::io::ingest::ParsedReport;
    use crate::series::{DateIndex, SeriesBuilder};

    fn small_store() -> SeriesStore {
        let d1 = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2020, 3, 2).unwrap();
        let tables = ReferenceTables::builtin();
        let corrections = CorrectionTable::empty();
        let config = PipelineConfig::for_scope(Scope::World, SourceMode::Local { dir: "unused".into() });
        let mut builder =
            SeriesBuilder::new(&config, DateIndex::from_dates([d1, d2]), &tables, &corrections).unwrap();
        for (date, confirmed) in [(d1, 10), (d2, 15)] {
            builder
                .ingest(ParsedReport {
                    date,
                    rows: vec![(2, RawRow::new("Italy", "", Counts::new(confirmed, 1, 0)))],
                    issues: Vec::new(),
                    rows_read: 1,
                })
                .unwrap();
        }
        builder.finish().store
    }

    #[test]
    fn csv_export_writes_one_line_per_date_and_location() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("series.csv");
        write_series_csv(&path, &small_store()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "date,location,confirmed,deaths,recovered,active,daily,daily_deaths,confirmed_normalized"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("2020-03-01,italy,10,1,0,9,,,"));
        assert!(lines[2].starts_with("2020-03-02,italy,15,1,0,14,5,0,"));
    }

    #[test]
    fn json_export_uses_null_for_undefined_values() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("series.json");
        let store = small_store();
        write_series_json(&path, &store, None).unwrap();

        let value: serde_json::Value = serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(value["store"]["scope"], "world");
        assert_eq!(value["store"]["dates"][1], "2020-03-02");
        let italy = &value["store"]["series"][LocationKey::new("italy").as_str()];
        assert!(italy["daily"][0].is_null());
        assert_eq!(italy["confirmed"][1], 15);
    }
}
