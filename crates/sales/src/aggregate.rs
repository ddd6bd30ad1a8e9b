//! Collapse raw sales rows into one series per unit.
//!
//! Rows are grouped by unit, then amounts sharing an identical timestamp are
//! summed. Input order does not matter; the output is always time-ascending.

use std::collections::BTreeMap;

use stockcast_core::UnitId;

use crate::record::SalesRecord;
use crate::series::{SeriesPoint, TimeSeries};

/// Group all records by unit and build one series per unit present in the input.
pub fn aggregate_by_unit<'a, I>(records: I) -> BTreeMap<UnitId, TimeSeries>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut grouped: BTreeMap<UnitId, Vec<SeriesPoint>> = BTreeMap::new();
    for r in records {
        grouped.entry(r.unit_id).or_default().push(SeriesPoint {
            timestamp: r.timestamp,
            value: r.amount,
        });
    }

    grouped
        .into_iter()
        .map(|(unit, points)| (unit, TimeSeries::from_points(points)))
        .collect()
}

/// Build the series of a single unit. A unit without rows yields an empty series.
pub fn aggregate_unit<'a, I>(records: I, unit: UnitId) -> TimeSeries
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    TimeSeries::from_points(
        records
            .into_iter()
            .filter(|r| r.unit_id == unit)
            .map(|r| SeriesPoint {
                timestamp: r.timestamp,
                value: r.amount,
            }),
    )
}
