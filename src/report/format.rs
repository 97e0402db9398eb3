//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the series code stays free of presentation concerns
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{Metric, PipelineConfig, SourceMode};
use crate::report::Rankings;
use crate::series::BuiltSeries;

/// Shown per unresolved location list before eliding.
const MAX_UNRESOLVED_LISTED: usize = 10;

/// Format the run summary (source, date coverage, row diagnostics).
pub fn format_run_summary(built: &BuiltSeries, config: &PipelineConfig) -> String {
    let mut out = String::new();
    let store = &built.store;
    let diag = &built.diagnostics;

    out.push_str(&format!("=== covid - {} daily series ===\n", config.scope.display_name()));
    out.push_str(&format!("Source: {}\n", describe_source(&config.source)));

    match (store.dates().first(), store.dates().last()) {
        (Some(first), Some(last)) => out.push_str(&format!("Dates: {first} .. {last}\n")),
        _ => out.push_str("Dates: (none)\n"),
    }
    out.push_str(&format!(
        "Dates used: {} | skipped: {}\n",
        store.dates().len(),
        diag.skipped_dates.len()
    ));
    for (date, reason) in &diag.skipped_dates {
        out.push_str(&format!("  (skipped {date}) {reason}\n"));
    }

    out.push_str(&format!("Locations: {}\n", store.len()));
    if let Some(sites) = &built.sites {
        out.push_str(&format!("Sites: {} over {} dates\n", sites.len(), sites.dates().len()));
    }
    out.push_str(&format!(
        "Rows: read={} used={} malformed={} unresolved={}\n",
        diag.rows_read,
        diag.rows_used,
        diag.malformed_count(),
        diag.unresolved_count()
    ));
    if !diag.corrections_applied.is_empty() {
        out.push_str(&format!("Corrections applied: {}\n", diag.corrections_applied.len()));
    }

    let unresolved = diag.unresolved_locations();
    if !unresolved.is_empty() {
        out.push_str("Unresolved locations:\n");
        for (location, count) in unresolved.iter().take(MAX_UNRESOLVED_LISTED) {
            out.push_str(&format!("  {location} (x{count})\n"));
        }
        if unresolved.len() > MAX_UNRESOLVED_LISTED {
            out.push_str(&format!("  ... and {} more\n", unresolved.len() - MAX_UNRESOLVED_LISTED));
        }
    }
    out.push('\n');

    out
}

/// Format a ranking table followed by the scope total.
pub fn format_rankings(rankings: &Rankings) -> String {
    let mut out = String::new();
    let metric = rankings.metric;

    out.push_str(&format!("Top {} by {} on {}:\n", rankings.rows.len(), metric.name(), rankings.date));
    out.push_str(format!("{:>4} {:<28} {:>14}", "#", "location", metric.name()).trim_end());
    out.push('\n');
    out.push_str(format!("{:-<4} {:-<28} {:-<14}", "", "", "").trim_end());
    out.push('\n');

    for (i, row) in rankings.rows.iter().enumerate() {
        out.push_str(
            format!(
                "{:>4} {:<28} {:>14}",
                i + 1,
                truncate(row.key.as_str(), 28),
                fmt_value(metric, row.value)
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out.push_str(format!("{:>4} {:<28} {:>14}", "", "total", fmt_value(metric, rankings.total)).trim_end());
    out.push('\n');
    out
}

fn describe_source(source: &SourceMode) -> String {
    match source {
        SourceMode::Remote { base_url, mirror_dir: Some(dir) } => {
            format!("{base_url} (mirrored to {})", dir.display())
        }
        SourceMode::Remote { base_url, mirror_dir: None } => base_url.clone(),
        SourceMode::Local { dir } => dir.display().to_string(),
    }
}

fn fmt_value(metric: Metric, v: f64) -> String {
    if v.is_nan() {
        return "-".to_string();
    }
    match metric {
        Metric::ConfirmedNormalized => format!("{v:.2}"),
        _ => format!("{v:.0}"),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{LocationKey, Scope};
    use crate::io::ingest::{IssueKind, RowIssue};
    use crate::report::RankedLocation;
    use crate::series::{DateIndex, Diagnostics, SeriesStore};

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, m, d).unwrap()
    }

    #[test]
    fn rankings_table_shows_undefined_as_dash() {
        let rankings = Rankings {
            metric: Metric::Daily,
            date: day(3, 2),
            rows: vec![
                RankedLocation {
                    key: LocationKey::new("new york"),
                    value: 1200.0,
                },
                RankedLocation {
                    key: LocationKey::new("grand princess"),
                    value: f64::NAN,
                },
            ],
            total: 1200.0,
        };

        let text = format_rankings(&rankings);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Top 2 by daily on 2020-03-02:");
        assert!(lines[3].contains("new york") && lines[3].ends_with("1200"));
        assert!(lines[4].contains("grand princess") && lines[4].ends_with('-'));
        assert!(lines[5].contains("total") && lines[5].ends_with("1200"));
    }

    #[test]
    fn summary_lists_skips_and_unresolved_locations() {
        let config = PipelineConfig::for_scope(Scope::Us, SourceMode::Local { dir: "reports".into() });
        let built = BuiltSeries {
            store: SeriesStore::new(Scope::Us, DateIndex::from_dates([day(3, 1), day(3, 3)])),
            sites: None,
            diagnostics: Diagnostics {
                rows_read: 3,
                rows_used: 2,
                issues: vec![RowIssue {
                    date: day(3, 1),
                    line: 4,
                    location: "Unassigned Location (From Diamond Princess)".to_string(),
                    kind: IssueKind::Unresolved,
                }],
                corrections_applied: Vec::new(),
                skipped_dates: vec![(day(3, 2), "truncated file".to_string())],
            },
        };

        let text = format_run_summary(&built, &config);
        assert!(text.contains("=== covid - US states daily series ==="));
        assert!(text.contains("Dates: 2020-03-01 .. 2020-03-03"));
        assert!(text.contains("Dates used: 2 | skipped: 1"));
        assert!(text.contains("(skipped 2020-03-02) truncated file"));
        assert!(text.contains("Rows: read=3 used=2 malformed=0 unresolved=1"));
        assert!(text.contains("Unassigned Location (From Diamond Princess) (x1)"));
    }

    #[test]
    fn long_names_are_truncated() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd.");
    }
}
