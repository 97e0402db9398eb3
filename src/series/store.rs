//! The per-location, per-date metric store produced by the pipeline.
//!
//! Every location holds one fixed-length array per metric, allocated when the
//! location is first seen and sized to the date index. Index `i` of every array
//! is the `i`-th date of the index, for every location.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Counts, LocationKey, Metric, Scope};
use crate::error::SeriesError;
use crate::series::date_index::DateIndex;

/// Aligned metric arrays for one location.
///
/// `daily`, `daily_deaths` and `confirmed_normalized` are floats so the
/// undefined first difference can be stored as `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSeries {
    pub confirmed: Vec<i64>,
    pub deaths: Vec<i64>,
    pub recovered: Vec<i64>,
    pub active: Vec<i64>,
    pub daily: Vec<f64>,
    pub daily_deaths: Vec<f64>,
    pub confirmed_normalized: Vec<f64>,
}

impl LocationSeries {
    fn zeros(len: usize) -> Self {
        let mut daily = vec![0.0; len];
        if let Some(first) = daily.first_mut() {
            *first = f64::NAN;
        }
        Self {
            confirmed: vec![0; len],
            deaths: vec![0; len],
            recovered: vec![0; len],
            active: vec![0; len],
            daily_deaths: daily.clone(),
            daily,
            confirmed_normalized: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.confirmed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.confirmed.is_empty()
    }

    /// Value of `metric` at `idx` (`NaN` when out of range).
    pub fn value(&self, metric: Metric, idx: usize) -> f64 {
        let value = match metric {
            Metric::Confirmed => self.confirmed.get(idx).map(|v| *v as f64),
            Metric::Deaths => self.deaths.get(idx).map(|v| *v as f64),
            Metric::Recovered => self.recovered.get(idx).map(|v| *v as f64),
            Metric::Active => self.active.get(idx).map(|v| *v as f64),
            Metric::Daily => self.daily.get(idx).copied(),
            Metric::DailyDeaths => self.daily_deaths.get(idx).copied(),
            Metric::ConfirmedNormalized => self.confirmed_normalized.get(idx).copied(),
        };
        value.unwrap_or(f64::NAN)
    }

    /// The whole series of `metric`, as floats.
    pub fn values(&self, metric: Metric) -> Vec<f64> {
        (0..self.len()).map(|i| self.value(metric, i)).collect()
    }

    pub fn counts(&self, idx: usize) -> Counts {
        Counts {
            confirmed: self.confirmed.get(idx).copied().unwrap_or(0),
            deaths: self.deaths.get(idx).copied().unwrap_or(0),
            recovered: self.recovered.get(idx).copied().unwrap_or(0),
        }
    }

    fn remove_slot(&mut self, idx: usize) {
        self.confirmed.remove(idx);
        self.deaths.remove(idx);
        self.recovered.remove(idx);
        self.active.remove(idx);
        self.daily.remove(idx);
        self.daily_deaths.remove(idx);
        self.confirmed_normalized.remove(idx);
        if idx == 0 {
            if let Some(first) = self.daily.first_mut() {
                *first = f64::NAN;
            }
            if let Some(first) = self.daily_deaths.first_mut() {
                *first = f64::NAN;
            }
        }
    }

    pub(crate) fn add_counts(&mut self, idx: usize, counts: Counts) {
        self.confirmed[idx] += counts.confirmed;
        self.deaths[idx] += counts.deaths;
        self.recovered[idx] += counts.recovered;
    }
}

/// Per-location series for one scope, aligned to one date index.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesStore {
    scope: Scope,
    dates: DateIndex,
    series: BTreeMap<LocationKey, LocationSeries>,
}

impl SeriesStore {
    pub fn new(scope: Scope, dates: DateIndex) -> Self {
        Self {
            scope,
            dates,
            series: BTreeMap::new(),
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn dates(&self) -> &DateIndex {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn get(&self, key: &LocationKey) -> Result<&LocationSeries, SeriesError> {
        self.series
            .get(key)
            .ok_or_else(|| SeriesError::KeyNotFound(key.clone()))
    }

    pub fn contains(&self, key: &LocationKey) -> bool {
        self.series.contains_key(key)
    }

    /// All location keys, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &LocationKey> {
        self.series.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LocationKey, &LocationSeries)> {
        self.series.iter()
    }

    /// Sum of `metric` at `idx` across every location not in `exclude`.
    ///
    /// `NaN` entries are skipped; the total is `NaN` only when every included
    /// location is undefined at `idx` (e.g. `daily` on the first date).
    pub fn total(&self, metric: Metric, idx: usize, exclude: &HashSet<LocationKey>) -> f64 {
        let values: Vec<f64> = self
            .series
            .iter()
            .filter(|(key, _)| !exclude.contains(*key))
            .map(|(_, s)| s.value(metric, idx))
            .collect();
        if !values.is_empty() && values.iter().all(|v| v.is_nan()) {
            return f64::NAN;
        }
        values.into_iter().filter(|v| !v.is_nan()).sum()
    }

    /// Allocate `key` if needed. Returns `true` when the location is new.
    pub(crate) fn ensure(&mut self, key: &LocationKey) -> bool {
        if self.series.contains_key(key) {
            return false;
        }
        self.series
            .insert(key.clone(), LocationSeries::zeros(self.dates.len()));
        true
    }

    /// Drop `date` from the index and its slot from every location.
    pub(crate) fn remove_date(&mut self, date: NaiveDate) -> Result<(), SeriesError> {
        let idx = self.dates.remove(date)?;
        for series in self.series.values_mut() {
            series.remove_slot(idx);
        }
        Ok(())
    }

    pub(crate) fn get_mut(&mut self, key: &LocationKey) -> Result<&mut LocationSeries, SeriesError> {
        self.series
            .get_mut(key)
            .ok_or_else(|| SeriesError::KeyNotFound(key.clone()))
    }
}
