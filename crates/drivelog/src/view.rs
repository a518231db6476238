//! Display projection of the drive log.
//!
//! [`render`] is a pure function of the records and their statistics; the
//! caller decides how to draw the result.

use serde::Serialize;

use crate::record::TripRecord;
use crate::stats::AggregateStats;

/// Shown in place of the list when there are no records.
pub const EMPTY_MESSAGE: &str = "No drive logs yet. Add your first entry above.";

/// Everything needed to draw the log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogView {
    /// One entry per record, newest first.
    pub entries: Vec<LogEntryView>,
    /// Totals block.
    pub stats: StatsView,
    /// Set when `entries` is empty.
    pub empty_message: Option<&'static str>,
    /// Whether export and email actions make sense.
    pub exports_enabled: bool,
}

/// One formatted trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntryView {
    /// Record id, for delete actions.
    pub id: String,
    /// Driver name.
    pub title: String,
    /// Date like `Jan 5, 2025`.
    pub date: String,
    /// `12.3 mi`.
    pub distance: String,
    /// `1.50 hrs`.
    pub duration: String,
    /// `45.0 mph`.
    pub avg_speed: String,
    /// `Highway`, `City`, ...
    pub road_type: String,
    /// `Day` or `Night`.
    pub day_night: String,
    /// `City, Country` with `N/A` fallbacks.
    pub location: String,
    /// VIN, if recorded.
    pub vin: Option<String>,
    /// Driver's license, if recorded.
    pub driver_license: Option<String>,
}

/// Formatted totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    /// `x.x mi`.
    pub total_distance: String,
    /// `x.x hrs`.
    pub total_duration: String,
    /// `x.x mph`.
    pub avg_speed: String,
    /// Number of trips.
    pub trip_count: usize,
}

impl From<&AggregateStats> for StatsView {
    fn from(stats: &AggregateStats) -> Self {
        Self {
            total_distance: format!("{:.1} mi", stats.total_distance),
            total_duration: format!("{:.1} hrs", stats.total_duration),
            avg_speed: format!("{:.1} mph", stats.avg_speed),
            trip_count: stats.trip_count,
        }
    }
}

impl From<&TripRecord> for LogEntryView {
    fn from(record: &TripRecord) -> Self {
        Self {
            id: record.id.to_string(),
            title: record.driver_name.clone(),
            date: record.date.format("%b %-d, %Y").to_string(),
            distance: format!("{:.1} mi", record.total_distance),
            duration: format!("{:.2} hrs", record.total_duration),
            avg_speed: format!("{:.1} mph", record.avg_speed),
            road_type: capitalize(record.road_type.as_str()),
            day_night: capitalize(record.day_night.as_str()),
            location: record.location(),
            vin: record.vin.clone(),
            driver_license: record.driver_license.clone(),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Project `records` and `stats` into a [`LogView`].
#[must_use]
pub fn render(records: &[TripRecord], stats: &AggregateStats) -> LogView {
    LogView {
        entries: records.iter().map(LogEntryView::from).collect(),
        stats: StatsView::from(stats),
        empty_message: records.is_empty().then_some(EMPTY_MESSAGE),
        exports_enabled: !records.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::sample_record;
    use crate::record::{DayNight, RoadType};
    use crate::stats::compute_stats;

    #[test]
    fn test_render_empty() {
        let view = render(&[], &AggregateStats::default());

        assert!(view.entries.is_empty());
        assert_eq!(view.empty_message, Some(EMPTY_MESSAGE));
        assert!(!view.exports_enabled);
        assert_eq!(view.stats.total_distance, "0.0 mi");
        assert_eq!(view.stats.avg_speed, "0.0 mph");
        assert_eq!(view.stats.trip_count, 0);
    }

    #[test]
    fn test_render_entry_formatting() {
        let mut record = sample_record("Ann", 12.345, 1.5);
        record.avg_speed = 45.0;
        record.road_type = RoadType::Rural;
        record.day_night = DayNight::Night;
        record.vin = Some("VIN123".to_string());

        let records = vec![record];
        let view = render(&records, &compute_stats(&records));
        let entry = &view.entries[0];

        assert_eq!(entry.title, "Ann");
        assert_eq!(entry.date, "Jan 5, 2025");
        assert_eq!(entry.distance, "12.3 mi");
        assert_eq!(entry.duration, "1.50 hrs");
        assert_eq!(entry.avg_speed, "45.0 mph");
        assert_eq!(entry.road_type, "Rural");
        assert_eq!(entry.day_night, "Night");
        assert_eq!(entry.location, "N/A, USA");
        assert_eq!(entry.vin.as_deref(), Some("VIN123"));
        assert_eq!(entry.driver_license, None);
        assert_eq!(entry.id, records[0].id.to_string());

        assert!(view.exports_enabled);
        assert_eq!(view.empty_message, None);
        assert_eq!(view.stats.total_duration, "1.5 hrs");
        assert_eq!(view.stats.avg_speed, "8.2 mph");
        assert_eq!(view.stats.trip_count, 1);
    }

    #[test]
    fn test_render_keeps_order() {
        let records = vec![sample_record("Newest", 1.0, 1.0), sample_record("Oldest", 1.0, 1.0)];
        let view = render(&records, &compute_stats(&records));
        let titles: Vec<&str> = view.entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Newest", "Oldest"]);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("highway"), "Highway");
        assert_eq!(capitalize(""), "");
    }
}
