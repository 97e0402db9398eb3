//! Manual overlays for known-bad report snapshots.
//!
//! Three kinds of entries are kept per scope:
//!
//! - **corrections**: replacement counts for a `(date, key)` pair, applied to the
//!   key's summed row for that date before it reaches the store
//! - **injected rows**: rows missing from a snapshot that are appended to it
//! - **discontinuities**: `(date, key)` pairs where the cumulative series resets,
//!   so the first difference is undefined

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::domain::{Counts, LocationKey, RawRow, Scope};

/// Replacement values for one location on one report date.
///
/// Fields left as `None` keep the value accumulated from the raw rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub date: NaiveDate,
    pub key: LocationKey,
    pub confirmed: Option<i64>,
    pub deaths: Option<i64>,
    pub recovered: Option<i64>,
    /// Only apply when the raw confirmed count moved less than this much from
    /// the previous report (i.e. the snapshot looks stale).
    pub stale_threshold: Option<i64>,
}

impl Correction {
    pub fn new(date: NaiveDate, key: &str, counts: Counts) -> Self {
        Self {
            date,
            key: LocationKey::new(key),
            confirmed: Some(counts.confirmed),
            deaths: Some(counts.deaths),
            recovered: Some(counts.recovered),
            stale_threshold: None,
        }
    }

    pub fn confirmed_only(date: NaiveDate, key: &str, confirmed: i64) -> Self {
        Self {
            date,
            key: LocationKey::new(key),
            confirmed: Some(confirmed),
            deaths: None,
            recovered: None,
            stale_threshold: None,
        }
    }

    pub fn when_stale(mut self, threshold: i64) -> Self {
        self.stale_threshold = Some(threshold);
        self
    }

    /// Returns the corrected counts, or `None` when the staleness guard rejects
    /// the correction.
    pub fn apply(&self, raw: Counts, previous_confirmed: i64) -> Option<Counts> {
        if let Some(threshold) = self.stale_threshold {
            if (raw.confirmed - previous_confirmed).abs() >= threshold {
                return None;
            }
        }
        Some(Counts {
            confirmed: self.confirmed.unwrap_or(raw.confirmed),
            deaths: self.deaths.unwrap_or(raw.deaths),
            recovered: self.recovered.unwrap_or(raw.recovered),
        })
    }
}

/// All overlays for a single scope.
#[derive(Debug, Clone, Default)]
pub struct CorrectionTable {
    corrections: HashMap<(NaiveDate, LocationKey), Correction>,
    injected: HashMap<NaiveDate, Vec<RawRow>>,
    discontinuities: HashSet<(NaiveDate, LocationKey)>,
}

impl CorrectionTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Overlays shipped with the crate.
    ///
    /// US values come from state health department tallies during the CSSE
    /// server maintenance window; world values from worldometers.
    pub fn builtin(scope: Scope) -> Self {
        match scope {
            Scope::Us => {
                let mar13 = ymd(2020, 3, 13);
                Self::empty()
                    .with_correction(Correction::confirmed_only(mar13, "new jersey", 51))
                    .with_correction(Correction::confirmed_only(mar13, "arkansas", 9))
                    .with_correction(Correction::confirmed_only(mar13, "colorado", 77))
                    .with_injected_row(ymd(2020, 3, 14), RawRow::new("US", "Alaska", Counts::new(1, 0, 0)))
            }
            Scope::World => {
                let mar12 = ymd(2020, 3, 12);
                Self::empty()
                    .with_correction(Correction::new(mar12, "italy", Counts::new(15113, 1016, 1258)).when_stale(200))
                    .with_correction(Correction::new(mar12, "france", Counts::new(2876, 61, 12)).when_stale(200))
                    .with_correction(Correction::new(mar12, "spain", Counts::new(3146, 86, 189)).when_stale(200))
                    .with_correction(Correction::new(mar12, "germany", Counts::new(2745, 6, 25)).when_stale(200))
                    .with_discontinuity(ymd(2020, 2, 13), "mainland china")
            }
        }
    }

    pub fn with_correction(mut self, correction: Correction) -> Self {
        self.corrections
            .insert((correction.date, correction.key.clone()), correction);
        self
    }

    pub fn with_injected_row(mut self, date: NaiveDate, row: RawRow) -> Self {
        self.injected.entry(date).or_default().push(row);
        self
    }

    pub fn with_discontinuity(mut self, date: NaiveDate, key: &str) -> Self {
        self.discontinuities.insert((date, LocationKey::new(key)));
        self
    }

    pub fn correction(&self, date: NaiveDate, key: &LocationKey) -> Option<&Correction> {
        self.corrections.get(&(date, key.clone()))
    }

    pub fn injected_rows(&self, date: NaiveDate) -> &[RawRow] {
        self.injected.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_discontinuity(&self, date: NaiveDate, key: &LocationKey) -> bool {
        self.discontinuities.contains(&(date, key.clone()))
    }
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}
