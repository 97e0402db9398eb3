//! Derived metrics computed from the accumulated cumulative counts.
//!
//! - `active = confirmed - recovered - deaths`
//! - `daily` / `daily_deaths`: first difference of the cumulative series, `NaN`
//!   on the first date and at declared discontinuities
//! - `confirmed_normalized`: confirmed cases per 100,000 residents

use tracing::debug;

use crate::data::{CorrectionTable, ReferenceTables};
use crate::domain::{LocationKey, NegativeDaily, PopulationPolicy, Scope};
use crate::error::SeriesError;
use crate::series::store::SeriesStore;

const PER_CAPITA_SCALE: f64 = 100_000.0;

/// Policies that shape the derived metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedOptions {
    pub negative_daily: NegativeDaily,
    pub daily_deaths: bool,
    pub population_policy: PopulationPolicy,
}

pub struct DerivedCalculator<'a> {
    scope: Scope,
    tables: &'a ReferenceTables,
    corrections: &'a CorrectionTable,
    options: DerivedOptions,
}

impl<'a> DerivedCalculator<'a> {
    pub fn new(
        scope: Scope,
        tables: &'a ReferenceTables,
        corrections: &'a CorrectionTable,
        options: DerivedOptions,
    ) -> Self {
        Self {
            scope,
            tables,
            corrections,
            options,
        }
    }

    /// Population used for `confirmed_normalized`, honoring the missing-value policy.
    ///
    /// `Ok(None)` means "unknown, store zero".
    pub fn population(&self, key: &LocationKey) -> Result<Option<u64>, SeriesError> {
        match self.tables.population(self.scope, key) {
            Some(pop) => Ok(Some(pop)),
            None => match self.options.population_policy {
                PopulationPolicy::Zero => Ok(None),
                PopulationPolicy::Strict => Err(SeriesError::PopulationMissing(key.clone())),
            },
        }
    }

    /// Recompute every derived field of `key` at `idx`.
    ///
    /// Must run after accumulation for `idx` is complete; `idx - 1` is read.
    pub fn update_derived(&self, store: &mut SeriesStore, key: &LocationKey, idx: usize) -> Result<(), SeriesError> {
        let Some(date) = store.dates().get(idx) else {
            return Err(SeriesError::PositionOutOfRange {
                position: idx,
                len: store.dates().len(),
            });
        };
        let population = self.population(key)?;
        let discontinuity = self.corrections.is_discontinuity(date, key);
        if discontinuity && idx > 0 {
            debug!(%key, idx, "cumulative series reset; daily change undefined");
        }

        let negative_daily = self.options.negative_daily;
        let series = store.get_mut(key)?;

        series.active[idx] = series.confirmed[idx] - series.recovered[idx] - series.deaths[idx];

        let previous = idx.checked_sub(1).filter(|_| !discontinuity);
        series.daily[idx] = match previous {
            Some(prev) => first_difference(series.confirmed[idx], series.confirmed[prev], negative_daily),
            None => f64::NAN,
        };
        series.daily_deaths[idx] = match previous {
            Some(prev) if self.options.daily_deaths => {
                first_difference(series.deaths[idx], series.deaths[prev], negative_daily)
            }
            _ => f64::NAN,
        };

        series.confirmed_normalized[idx] = population.map_or(0.0, |pop| per_100k(series.confirmed[idx], pop));
        Ok(())
    }

    /// Recompute `key` for every date up to and including `idx`.
    ///
    /// Used when a location first appears part-way through the index.
    pub fn backfill(&self, store: &mut SeriesStore, key: &LocationKey, idx: usize) -> Result<(), SeriesError> {
        for i in 0..=idx {
            self.update_derived(store, key, i)?;
        }
        Ok(())
    }
}

/// `current - previous`, optionally clamped at zero.
pub fn first_difference(current: i64, previous: i64, policy: NegativeDaily) -> f64 {
    let delta = current - previous;
    match policy {
        NegativeDaily::Floor if delta < 0 => 0.0,
        _ => delta as f64,
    }
}

/// Cases per 100,000 residents.
pub fn per_100k(count: i64, population: u64) -> f64 {
    if population == 0 {
        return 0.0;
    }
    count as f64 / population as f64 * PER_CAPITA_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Counts;
    use crate::series::date_index::DateIndex;
    use chrono::NaiveDate;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, m, d).unwrap()
    }

    fn options(negative_daily: NegativeDaily, population_policy: PopulationPolicy) -> DerivedOptions {
        DerivedOptions {
            negative_daily,
            daily_deaths: true,
            population_policy,
        }
    }

    #[test]
    fn per_100k_matches_reference_value() {
        assert_eq!(per_100k(1000, 500_000), 200.0);
        assert_eq!(per_100k(5, 0), 0.0);
    }

    #[test]
    fn negative_policy_is_explicit() {
        assert_eq!(first_difference(5, 8, NegativeDaily::Keep), -3.0);
        assert_eq!(first_difference(5, 8, NegativeDaily::Floor), 0.0);
        assert_eq!(first_difference(9, 8, NegativeDaily::Floor), 1.0);
    }

    #[test]
    fn discontinuity_dates_are_undefined() {
        let tables = ReferenceTables::builtin();
        let corrections = CorrectionTable::builtin(Scope::World);
        let calc = DerivedCalculator::new(
            Scope::World,
            &tables,
            &corrections,
            options(NegativeDaily::Keep, PopulationPolicy::Zero),
        );

        let mut store = SeriesStore::new(Scope::World, DateIndex::from_dates([day(2, 12), day(2, 13), day(2, 14)]));
        let key = LocationKey::new("mainland china");
        store.ensure(&key);
        for (i, confirmed) in [44_653, 59_804, 63_851].into_iter().enumerate() {
            store.get_mut(&key).unwrap().add_counts(i, Counts::new(confirmed, 0, 0));
            calc.update_derived(&mut store, &key, i).unwrap();
        }

        let series = store.get(&key).unwrap();
        assert!(series.daily[0].is_nan());
        assert!(series.daily[1].is_nan());
        assert_eq!(series.daily[2], 4047.0);
        assert!(series.confirmed_normalized[2] > 4.0);
    }

    #[test]
    fn normalized_rate_uses_the_population_table() {
        let tables = ReferenceTables::builtin().with_population(Scope::World, "atlantis", 500_000);
        let corrections = CorrectionTable::empty();
        let calc = DerivedCalculator::new(
            Scope::World,
            &tables,
            &corrections,
            options(NegativeDaily::Keep, PopulationPolicy::Strict),
        );
        let mut store = SeriesStore::new(Scope::World, DateIndex::from_dates([day(3, 1)]));
        let key = LocationKey::new("Atlantis");
        store.ensure(&key);
        store.get_mut(&key).unwrap().add_counts(0, Counts::new(1000, 0, 0));

        calc.update_derived(&mut store, &key, 0).unwrap();
        assert_eq!(store.get(&key).unwrap().confirmed_normalized[0], 200.0);
    }

    #[test]
    fn positions_past_the_index_are_rejected() {
        let tables = ReferenceTables::builtin();
        let corrections = CorrectionTable::empty();
        let calc = DerivedCalculator::new(
            Scope::World,
            &tables,
            &corrections,
            options(NegativeDaily::Keep, PopulationPolicy::Zero),
        );
        let mut store = SeriesStore::new(Scope::World, DateIndex::from_dates([day(3, 1)]));
        let key = LocationKey::new("italy");
        store.ensure(&key);

        assert_eq!(
            calc.update_derived(&mut store, &key, 1),
            Err(SeriesError::PositionOutOfRange { position: 1, len: 1 })
        );
    }

    #[test]
    fn missing_population_follows_policy() {
        let tables = ReferenceTables::builtin();
        let corrections = CorrectionTable::empty();
        let mut store = SeriesStore::new(Scope::World, DateIndex::from_dates([day(3, 1)]));
        let key = LocationKey::new("andorra");
        store.ensure(&key);
        store.get_mut(&key).unwrap().add_counts(0, Counts::new(1, 0, 0));

        let lenient = DerivedCalculator::new(
            Scope::World,
            &tables,
            &corrections,
            options(NegativeDaily::Keep, PopulationPolicy::Zero),
        );
        lenient.update_derived(&mut store, &key, 0).unwrap();
        assert_eq!(store.get(&key).unwrap().confirmed_normalized[0], 0.0);

        let strict = DerivedCalculator::new(
            Scope::World,
            &tables,
            &corrections,
            options(NegativeDaily::Keep, PopulationPolicy::Strict),
        );
        assert_eq!(
            strict.update_derived(&mut store, &key, 0),
            Err(SeriesError::PopulationMissing(key.clone()))
        );
    }

    #[test]
    fn daily_deaths_can_be_disabled() {
        let tables = ReferenceTables::builtin();
        let corrections = CorrectionTable::empty();
        let calc = DerivedCalculator::new(
            Scope::Us,
            &tables,
            &corrections,
            DerivedOptions {
                negative_daily: NegativeDaily::Keep,
                daily_deaths: false,
                population_policy: PopulationPolicy::Zero,
            },
        );
        let mut store = SeriesStore::new(Scope::Us, DateIndex::from_dates([day(3, 1), day(3, 2)]));
        let key = LocationKey::new("washington");
        store.ensure(&key);
        store.get_mut(&key).unwrap().add_counts(1, Counts::new(4, 2, 0));
        calc.backfill(&mut store, &key, 1).unwrap();

        let series = store.get(&key).unwrap();
        assert_eq!(series.daily[1], 4.0);
        assert!(series.daily_deaths[1].is_nan());
        assert_eq!(series.active[1], 2);
    }
}
