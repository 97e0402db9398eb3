//! Ordered report dates with constant-time position lookup.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use serde::{Serialize, Serializer};

use crate::error::SeriesError;

/// Strictly increasing sequence of dates for which a snapshot exists.
///
/// Dates without a snapshot are simply absent; there are no null slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateIndex {
    dates: Vec<NaiveDate>,
    positions: HashMap<NaiveDate, usize>,
}

impl DateIndex {
    /// Walk `start..=end` one day at a time, keeping dates `keep` accepts.
    pub fn build(start: NaiveDate, end: NaiveDate, mut keep: impl FnMut(NaiveDate) -> bool) -> Self {
        Self::from_dates(day_range(start, end).filter(|d| keep(*d)))
    }

    /// Index over an arbitrary set of dates (sorted, duplicates dropped).
    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        let mut dates: Vec<NaiveDate> = dates.into_iter().collect();
        dates.sort_unstable();
        dates.dedup();
        let positions = dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
        Self { dates, positions }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn get(&self, idx: usize) -> Option<NaiveDate> {
        self.dates.get(idx).copied()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.positions.contains_key(&date)
    }

    pub fn index_of(&self, date: NaiveDate) -> Result<usize, SeriesError> {
        self.positions
            .get(&date)
            .copied()
            .ok_or(SeriesError::DateNotFound(date))
    }

    /// Drop `date`, shifting every later position down by one.
    pub(crate) fn remove(&mut self, date: NaiveDate) -> Result<usize, SeriesError> {
        let idx = self.index_of(date)?;
        self.dates.remove(idx);
        self.positions = self.dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
        Ok(idx)
    }

    /// The sub-index of dates on or after `cutover` (site-level granularity).
    pub fn since(&self, cutover: NaiveDate) -> DateIndex {
        Self::from_dates(self.dates.iter().copied().filter(|d| *d >= cutover))
    }
}

impl Serialize for DateIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.dates.serialize(serializer)
    }
}

/// Every calendar day in `start..=end`.
pub fn day_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(start), |d| d.checked_add_days(Days::new(1))).take_while(move |d| *d <= end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, m, d).unwrap()
    }

    #[test]
    fn missing_dates_are_absent_not_null() {
        let index = DateIndex::build(day(1, 22), day(1, 26), |d| d != day(1, 24));
        assert_eq!(index.len(), 4);
        assert_eq!(index.index_of(day(1, 25)).unwrap(), 2);
        assert_eq!(index.index_of(day(1, 24)), Err(SeriesError::DateNotFound(day(1, 24))));
        assert!(index.index_of(day(2, 1)).is_err());
    }

    #[test]
    fn from_dates_sorts_and_dedups() {
        let index = DateIndex::from_dates([day(3, 2), day(3, 1), day(3, 2)]);
        assert_eq!(index.dates(), &[day(3, 1), day(3, 2)]);
        assert_eq!(index.first(), Some(day(3, 1)));
        assert_eq!(index.last(), Some(day(3, 2)));
    }

    #[test]
    fn site_index_starts_at_cutover() {
        let index = DateIndex::build(day(2, 27), day(3, 3), |_| true);
        let sites = index.since(day(3, 1));
        assert_eq!(sites.len(), 3);
        assert_eq!(sites.index_of(day(3, 1)).unwrap(), 0);
        assert!(!sites.contains(day(2, 29)));
    }

    #[test]
    fn removing_a_date_shifts_later_positions() {
        let mut index = DateIndex::from_dates([day(3, 1), day(3, 2), day(3, 3)]);
        assert_eq!(index.remove(day(3, 2)), Ok(1));
        assert_eq!(index.index_of(day(3, 3)), Ok(1));
        assert!(!index.contains(day(3, 2)));
        assert_eq!(index.remove(day(3, 2)), Err(SeriesError::DateNotFound(day(3, 2))));
    }

    #[test]
    fn day_range_is_inclusive() {
        assert_eq!(day_range(day(2, 28), day(3, 1)).count(), 3);
        assert_eq!(day_range(day(3, 2), day(3, 1)).count(), 0);
    }
}
