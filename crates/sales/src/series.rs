//! Per-unit time series.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// One observation of a series: total amount sold at `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Decimal,
}

/// Ordered sequence of observations for a single unit.
///
/// Invariant: timestamps are strictly ascending (and therefore unique). The only
/// ways to build a series go through [`TimeSeries::from_points`], which sorts and
/// merges duplicate timestamps by summing their values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeries {
    points: Vec<SeriesPoint>,
}

impl TimeSeries {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a series from arbitrary points (any order, duplicates allowed).
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = SeriesPoint>,
    {
        let mut merged: BTreeMap<DateTime<Utc>, Decimal> = BTreeMap::new();
        for p in points {
            let slot = merged.entry(p.timestamp).or_insert(Decimal::ZERO);
            *slot = slot.saturating_add(p.value);
        }

        Self {
            points: merged
                .into_iter()
                .map(|(timestamp, value)| SeriesPoint { timestamp, value })
                .collect(),
        }
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.first().map(|p| p.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.timestamp)
    }

    /// Values as `f64` for numeric models.
    pub fn values_f64(&self) -> Vec<f64> {
        self.points
            .iter()
            .map(|p| p.value.to_f64().unwrap_or(0.0))
            .collect()
    }

    /// Exact total of all values.
    pub fn total(&self) -> Decimal {
        self.points
            .iter()
            .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.value))
    }

    /// Arithmetic mean of the values; `0.0` for an empty series.
    pub fn mean(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        let n = Decimal::from(self.points.len() as u64);
        (self.total() / n).to_f64().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn from_points_sorts_and_merges_duplicates() {
        let series = TimeSeries::from_points(vec![
            SeriesPoint { timestamp: at(2), value: dec!(5) },
            SeriesPoint { timestamp: at(1), value: dec!(10) },
            SeriesPoint { timestamp: at(1), value: dec!(20) },
        ]);

        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0], SeriesPoint { timestamp: at(1), value: dec!(30) });
        assert_eq!(series.points()[1], SeriesPoint { timestamp: at(2), value: dec!(5) });
        assert_eq!(series.first_timestamp(), Some(at(1)));
        assert_eq!(series.last_timestamp(), Some(at(2)));
    }

    #[test]
    fn mean_of_empty_series_is_zero() {
        assert_eq!(TimeSeries::empty().mean(), 0.0);
    }

    #[test]
    fn mean_uses_exact_decimal_total() {
        let series = TimeSeries::from_points(vec![
            SeriesPoint { timestamp: at(1), value: dec!(30) },
            SeriesPoint { timestamp: at(2), value: dec!(5) },
        ]);
        assert_eq!(series.total(), dec!(35));
        assert_eq!(series.mean(), 17.5);
    }
}
