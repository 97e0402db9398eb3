//! Row aggregation: one date's raw rows → summed counts per canonical key.
//!
//! Rows are resolved, grouped by key and summed first; correction overlays then
//! replace a key's summed counts before they are written to the store. Grouping
//! first means a replacement value is written once per key, no matter how many
//! sub-regions fold into it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::data::tables::{DIAMOND_PRINCESS, GRAND_PRINCESS};
use crate::data::CorrectionTable;
use crate::domain::{Counts, LocationKey, RawRow, Scope};
use crate::error::SeriesError;
use crate::io::ingest::{IssueKind, RowIssue};
use crate::location::{LocationNormalizer, Resolution};
use crate::series::sites::SiteStore;
use crate::series::store::SeriesStore;

/// What happened while accumulating one date.
#[derive(Debug, Clone, Default)]
pub struct DateOutcome {
    pub rows_used: usize,
    pub issues: Vec<RowIssue>,
    pub corrections_applied: Vec<LocationKey>,
    /// Locations allocated for the first time on this date.
    pub new_keys: Vec<LocationKey>,
}

pub struct RowAggregator<'a> {
    scope: Scope,
    normalizer: LocationNormalizer<'a>,
    corrections: &'a CorrectionTable,
}

impl<'a> RowAggregator<'a> {
    pub fn new(scope: Scope, normalizer: LocationNormalizer<'a>, corrections: &'a CorrectionTable) -> Self {
        Self {
            scope,
            normalizer,
            corrections,
        }
    }

    /// Accumulate `rows` (with their CSV line numbers) into `store` at `date`.
    ///
    /// Injected rows registered for `date` are appended. When `sites` is given,
    /// rows that resolved to a state are also recorded at site level.
    pub fn accumulate(
        &self,
        rows: &[(usize, RawRow)],
        date: NaiveDate,
        store: &mut SeriesStore,
        mut sites: Option<&mut SiteStore>,
    ) -> Result<DateOutcome, SeriesError> {
        let idx = store.dates().index_of(date)?;
        let mut outcome = DateOutcome::default();

        let injected = self.corrections.injected_rows(date);
        if !injected.is_empty() {
            debug!(%date, count = injected.len(), "appending injected rows");
        }
        let all_rows = rows.iter().map(|(line, row)| (*line, row)).chain(injected.iter().map(|row| (0, row)));

        let mut grouped: BTreeMap<LocationKey, Counts> = BTreeMap::new();
        for (line, row) in all_rows {
            let raw = self.raw_location(row);
            let key = match self.normalizer.normalize(raw, date) {
                Resolution::Key(key) => key,
                Resolution::Unresolved => {
                    debug!(%date, line, location = raw, "unresolved location; row dropped");
                    outcome.issues.push(RowIssue {
                        date,
                        line,
                        location: raw.to_string(),
                        kind: IssueKind::Unresolved,
                    });
                    continue;
                }
            };

            if let Some(sites) = sites.as_deref_mut() {
                if self.scope == Scope::Us && !is_ship(&key) {
                    sites.record(date, row);
                }
            }

            *grouped.entry(key).or_default() += row.counts;
            outcome.rows_used += 1;
        }

        for (key, mut counts) in grouped {
            if let Some(correction) = self.corrections.correction(date, &key) {
                let previous = match idx.checked_sub(1) {
                    Some(prev) => store.get(&key).map(|s| s.confirmed[prev]).unwrap_or(0),
                    None => 0,
                };
                if let Some(corrected) = correction.apply(counts, previous) {
                    debug!(%date, %key, raw = ?counts, corrected = ?corrected, "correction overlay applied");
                    counts = corrected;
                    outcome.corrections_applied.push(key.clone());
                }
            }

            if store.ensure(&key) {
                outcome.new_keys.push(key.clone());
            }
            store.get_mut(&key)?.add_counts(idx, counts);
        }

        if let Some(sites) = sites {
            sites.finish_date(date);
        }

        Ok(outcome)
    }

    fn raw_location<'r>(&self, row: &'r RawRow) -> &'r str {
        match self.scope {
            Scope::Us => &row.location,
            Scope::World => &row.country,
        }
    }
}

fn is_ship(key: &LocationKey) -> bool {
    key.as_str() == DIAMOND_PRINCESS || key.as_str() == GRAND_PRINCESS
}
