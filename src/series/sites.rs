//! Site-level (point) series for map annotations.
//!
//! Unlike the regional store, sites are keyed by their raw label and counts are
//! assigned rather than summed: one report row is one site.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::RawRow;
use crate::series::date_index::DateIndex;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteSeries {
    pub latitude: f64,
    pub longitude: f64,
    pub confirmed: Vec<i64>,
    pub deaths: Vec<i64>,
    pub recovered: Vec<i64>,
    pub active: Vec<i64>,
    pub daily: Vec<f64>,
}

impl SiteSeries {
    fn remove_slot(&mut self, idx: usize) {
        self.confirmed.remove(idx);
        self.deaths.remove(idx);
        self.recovered.remove(idx);
        self.active.remove(idx);
        self.daily.remove(idx);
        if idx == 0 {
            if let Some(first) = self.daily.first_mut() {
                *first = f64::NAN;
            }
        }
    }

    fn new(latitude: f64, longitude: f64, len: usize) -> Self {
        let mut daily = vec![0.0; len];
        if let Some(first) = daily.first_mut() {
            *first = f64::NAN;
        }
        Self {
            latitude,
            longitude,
            confirmed: vec![0; len],
            deaths: vec![0; len],
            recovered: vec![0; len],
            active: vec![0; len],
            daily,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteStore {
    dates: DateIndex,
    sites: BTreeMap<String, SiteSeries>,
    /// Labels recorded for the date currently being accumulated.
    #[serde(skip)]
    touched: BTreeSet<String>,
}

impl SiteStore {
    pub fn new(dates: DateIndex) -> Self {
        Self {
            dates,
            sites: BTreeMap::new(),
            touched: BTreeSet::new(),
        }
    }

    pub fn dates(&self) -> &DateIndex {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&SiteSeries> {
        self.sites.get(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SiteSeries)> {
        self.sites.iter()
    }

    /// Record `row` for `date`. Returns `false` when the date precedes the
    /// site index or the row has no coordinates.
    pub fn record(&mut self, date: NaiveDate, row: &RawRow) -> bool {
        let Ok(idx) = self.dates.index_of(date) else {
            return false;
        };
        let Some((lat, lon)) = row.coordinates() else {
            return false;
        };
        let len = self.dates.len();
        let label = row.site_label().to_string();
        self.touched.insert(label.clone());
        let site = self
            .sites
            .entry(label)
            .or_insert_with(|| SiteSeries::new(lat, lon, len));
        site.confirmed[idx] = row.counts.confirmed;
        site.deaths[idx] = row.counts.deaths;
        site.recovered[idx] = row.counts.recovered;
        true
    }

    /// Refresh `active` and `daily` at `date` for the sites recorded on it.
    ///
    /// Sites without a row that day keep their zero defaults.
    pub fn finish_date(&mut self, date: NaiveDate) {
        let touched = std::mem::take(&mut self.touched);
        let Ok(idx) = self.dates.index_of(date) else {
            return;
        };
        for label in &touched {
            let Some(site) = self.sites.get_mut(label) else {
                continue;
            };
            site.active[idx] = site.confirmed[idx] - site.recovered[idx] - site.deaths[idx];
            site.daily[idx] = match idx.checked_sub(1) {
                Some(prev) => (site.confirmed[idx] - site.confirmed[prev]) as f64,
                None => f64::NAN,
            };
        }
    }

    /// Drop `date` from the site index, if it is part of it.
    pub(crate) fn remove_date(&mut self, date: NaiveDate) {
        let Ok(idx) = self.dates.remove(date) else {
            return;
        };
        for site in self.sites.values_mut() {
            site.remove_slot(idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Counts;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, m, d).unwrap()
    }

    fn site_row(label: &str, confirmed: i64) -> RawRow {
        let mut row = RawRow::new("US", label, Counts::new(confirmed, 0, 0));
        row.latitude = Some(47.6);
        row.longitude = Some(-122.1);
        row
    }

    #[test]
    fn sites_assign_rather_than_sum() {
        let dates = DateIndex::from_dates([day(2, 29), day(3, 1), day(3, 2)]).since(day(3, 1));
        let mut sites = SiteStore::new(dates);

        assert!(!sites.record(day(2, 29), &site_row("King County, WA", 5)));
        assert!(sites.record(day(3, 1), &site_row("King County, WA", 5)));
        assert!(sites.record(day(3, 1), &site_row("King County, WA", 6)));
        sites.finish_date(day(3, 1));
        assert!(sites.record(day(3, 2), &site_row("King County, WA", 10)));
        sites.finish_date(day(3, 2));

        let king = sites.get("King County, WA").unwrap();
        assert_eq!(king.confirmed, vec![6, 10]);
        assert!(king.daily[0].is_nan());
        assert_eq!(king.daily[1], 4.0);
        assert_eq!(king.latitude, 47.6);
    }

    #[test]
    fn rows_without_coordinates_are_ignored() {
        let mut sites = SiteStore::new(DateIndex::from_dates([day(3, 1)]));
        let row = RawRow::new("US", "Washington", Counts::new(1, 0, 0));
        assert!(!sites.record(day(3, 1), &row));
        assert!(sites.is_empty());
    }

    #[test]
    fn sites_without_a_row_keep_zero_daily() {
        let mut sites = SiteStore::new(DateIndex::from_dates([day(3, 1), day(3, 2), day(3, 3)]));

        assert!(sites.record(day(3, 1), &site_row("King County, WA", 50)));
        sites.finish_date(day(3, 1));
        // Legacy label disappears; the new-schema label takes over.
        assert!(sites.record(day(3, 2), &site_row("King, Washington, US", 60)));
        sites.finish_date(day(3, 2));
        assert!(sites.record(day(3, 3), &site_row("King, Washington, US", 75)));
        sites.finish_date(day(3, 3));

        let legacy = sites.get("King County, WA").unwrap();
        assert_eq!(legacy.confirmed, vec![50, 0, 0]);
        assert_eq!(legacy.daily[1], 0.0);
        assert_eq!(legacy.daily[2], 0.0);

        let current = sites.get("King, Washington, US").unwrap();
        assert_eq!(current.daily[1], 60.0);
        assert_eq!(current.daily[2], 15.0);
        assert_eq!(current.active[2], 75);
    }

    #[test]
    fn dropping_a_site_date_keeps_arrays_aligned() {
        let mut sites = SiteStore::new(DateIndex::from_dates([day(3, 1), day(3, 2), day(3, 3)]));
        assert!(sites.record(day(3, 1), &site_row("King County, WA", 5)));
        sites.finish_date(day(3, 1));

        sites.remove_date(day(3, 2));
        sites.remove_date(day(2, 1));
        assert_eq!(sites.dates().len(), 2);
        assert!(sites.record(day(3, 3), &site_row("King County, WA", 9)));
        sites.finish_date(day(3, 3));

        let king = sites.get("King County, WA").unwrap();
        assert_eq!(king.confirmed, vec![5, 9]);
        assert_eq!(king.daily[1], 4.0);
    }
}
