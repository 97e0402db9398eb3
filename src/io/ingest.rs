//! Daily report CSV ingest.
//!
//! This module is responsible for turning one day's CSSE report (whatever
//! schema generation it uses) into a list of `RawRow`s.
//!
//! Design goals:
//! - **Schema drift tolerant**: `Province/State` and `Province_State` (etc.) are
//!   the same column after header normalization
//! - **Row-level validation**: skip bad rows, but report what happened
//! - **Separation of concerns**: no location resolution or accumulation here

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::warn;

use crate::domain::{Counts, RawRow, Scope};
use crate::error::AppError;

/// Why a row did not make it into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// A numeric field could not be parsed.
    Malformed(String),
    /// The location string did not resolve to a canonical key.
    Unresolved,
}

/// A row-level problem encountered during ingest or aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    pub date: NaiveDate,
    /// 1-based CSV line (0 for rows that did not come from a file).
    pub line: usize,
    pub location: String,
    pub kind: IssueKind,
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::Malformed(msg) => {
                write!(f, "{} line {}: malformed row '{}': {msg}", self.date, self.line, self.location)
            }
            IssueKind::Unresolved => {
                write!(f, "{} line {}: unresolved location '{}'", self.date, self.line, self.location)
            }
        }
    }
}

/// Ingest output for one report date.
#[derive(Debug, Clone)]
pub struct ParsedReport {
    pub date: NaiveDate,
    /// Rows in scope, with their 1-based CSV line numbers.
    pub rows: Vec<(usize, RawRow)>,
    pub issues: Vec<RowIssue>,
    pub rows_read: usize,
}

/// Parse one report's CSV text.
///
/// Fails only when the header lacks a column the pipeline cannot do without;
/// the caller treats that like an unavailable date.
pub fn parse_daily_report(text: &str, date: NaiveDate, scope: Scope) -> Result<ParsedReport, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(4, format!("Failed to read report headers for {date}: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map, date)?;

    let mut rows = Vec::new();
    let mut issues = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: header occupies line 1 and CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                issues.push(malformed(date, line, "", format!("CSV parse error: {e}")));
                continue;
            }
        };

        let country = get_optional(&record, &header_map, "country_region").unwrap_or("");
        if scope == Scope::Us && country != "US" {
            continue;
        }
        let location = get_optional(&record, &header_map, "province_state").unwrap_or("");

        match parse_row(&record, &header_map, country, location) {
            Ok(row) => rows.push((line, row)),
            Err(message) => {
                let label = if location.is_empty() { country } else { location };
                let issue = malformed(date, line, label, message);
                warn!("{issue}");
                issues.push(issue);
            }
        }
    }

    Ok(ParsedReport {
        date,
        rows,
        issues,
        rows_read,
    })
}

fn malformed(date: NaiveDate, line: usize, location: &str, message: String) -> RowIssue {
    RowIssue {
        date,
        line,
        location: location.to_string(),
        kind: IssueKind::Malformed(message),
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

/// Normalize a header so both report schema generations agree.
///
/// `Province/State` and `Province_State` → `province_state`, `Lat` → `latitude`,
/// `Long_` → `longitude`.
fn normalize_header_name(name: &str) -> String {
    // Some snapshots start with a UTF-8 BOM on the first header.
    let name = name.trim().trim_start_matches('\u{feff}');
    let name = name.to_ascii_lowercase().replace('/', "_");
    match name.as_str() {
        "lat" => "latitude".to_string(),
        "long_" | "long" => "longitude".to_string(),
        _ => name,
    }
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>, date: NaiveDate) -> Result<(), AppError> {
    for column in ["country_region", "confirmed"] {
        if !header_map.contains_key(column) {
            return Err(AppError::new(
                4,
                format!("Report for {date} is missing required column `{column}`."),
            ));
        }
    }
    Ok(())
}

fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    country: &str,
    location: &str,
) -> Result<RawRow, String> {
    let counts = Counts {
        confirmed: parse_count(get_optional(record, header_map, "confirmed"), "Confirmed")?,
        deaths: parse_count(get_optional(record, header_map, "deaths"), "Deaths")?,
        recovered: parse_count(get_optional(record, header_map, "recovered"), "Recovered")?,
    };

    let mut row = RawRow::new(country, location, counts);
    row.combined_key = get_optional(record, header_map, "combined_key").map(str::to_string);
    row.latitude = parse_opt_f64(get_optional(record, header_map, "latitude"));
    row.longitude = parse_opt_f64(get_optional(record, header_map, "longitude"));
    Ok(row)
}

/// Parse a cumulative count. Absent/empty values are zero.
fn parse_count(s: Option<&str>, name: &str) -> Result<i64, String> {
    let Some(s) = s else { return Ok(0) };
    if let Ok(v) = s.parse::<i64>() {
        return Ok(v);
    }
    // Some snapshots store counts as floats ("12.0").
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        _ => Err(format!("Invalid `{name}` value '{s}'.")),
    }
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?;
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
