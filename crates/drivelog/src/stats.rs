//! Aggregate statistics over the drive log.

use serde::{Deserialize, Serialize};

use crate::record::{average_speed, TripRecord};

/// Totals and averages over every record in the log.
///
/// Always derived from the full collection by [`compute_stats`]; never
/// persisted and never patched incrementally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    /// Sum of distances, in miles.
    pub total_distance: f64,
    /// Sum of durations, in hours.
    pub total_duration: f64,
    /// `total_distance / total_duration`, or 0 when no time was logged.
    pub avg_speed: f64,
    /// Number of trips.
    pub trip_count: usize,
}

/// Compute aggregate statistics for `records`.
#[must_use]
pub fn compute_stats(records: &[TripRecord]) -> AggregateStats {
    let total_distance = ordered_sum(records.iter().map(|r| r.total_distance));
    let total_duration = ordered_sum(records.iter().map(|r| r.total_duration));

    AggregateStats {
        total_distance,
        total_duration,
        avg_speed: average_speed(total_distance, total_duration),
        trip_count: records.len(),
    }
}

/// Sum of `values` taken in ascending order.
fn ordered_sum(values: impl Iterator<Item = f64>) -> f64 {
    let mut values: Vec<f64> = values.collect();
    values.sort_by(f64::total_cmp);
    values.into_iter().fold(0.0, |acc, v| acc + v)
}
