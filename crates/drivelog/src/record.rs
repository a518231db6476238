//! Core trip record types for drivelog.
//!
//! A [`TripRecord`] is one committed drive. Records are immutable once
//! created; the log only ever prepends or removes them.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a trip record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(Uuid);

impl TripId {
    /// Generate a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TripId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TripId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// The kind of road a trip was mostly driven on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadType {
    /// Motorway / interstate.
    Highway,
    /// Urban streets.
    City,
    /// Country roads.
    Rural,
    /// A mix of the above.
    Mixed,
}

impl RoadType {
    /// All road types, in display order.
    pub const ALL: [Self; 4] = [Self::Highway, Self::City, Self::Rural, Self::Mixed];

    /// The lowercase name used in exports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Highway => "highway",
            Self::City => "city",
            Self::Rural => "rural",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for RoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoadType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown road type '{wanted}'"))
    }
}

/// Whether a trip was driven in daylight or at night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayNight {
    /// Daylight driving.
    Day,
    /// Night driving.
    Night,
}

impl DayNight {
    /// Both values, in display order.
    pub const ALL: [Self; 2] = [Self::Day, Self::Night];

    /// The lowercase name used in exports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Night => "night",
        }
    }
}

impl fmt::Display for DayNight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayNight {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("expected 'day' or 'night', got '{wanted}'"))
    }
}

/// One completed, committed drive.
///
/// Field names serialize in camelCase (`driverName`, `totalDistance`, ...).
/// Distances are in miles, durations in hours and speeds in miles per hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRecord {
    /// Unique identifier, assigned at commit time.
    pub id: TripId,

    /// Calendar date of the drive.
    pub date: NaiveDate,

    /// Road type driven.
    pub road_type: RoadType,

    /// Day or night driving.
    pub day_night: DayNight,

    /// Vehicle identification number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,

    /// Display name of the driver.
    pub driver_name: String,

    /// Driver's license number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_license: Option<String>,

    /// Country the trip took place in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// City the trip took place in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// Distance driven, in miles.
    pub total_distance: f64,

    /// Time driven, in hours.
    pub total_duration: f64,

    /// Average speed in mph, as submitted.
    pub avg_speed: f64,
}

impl TripRecord {
    /// `"City, Country"` with `N/A` standing in for missing parts.
    #[must_use]
    pub fn location(&self) -> String {
        format!(
            "{}, {}",
            self.city.as_deref().unwrap_or("N/A"),
            self.country.as_deref().unwrap_or("N/A")
        )
    }
}

/// `distance / duration`, guarded so a zero duration yields a clean 0.
#[must_use]
pub fn average_speed(distance: f64, duration: f64) -> f64 {
    if duration > 0.0 {
        distance / duration
    } else {
        0.0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a record with the given numbers and fixed contextual fields.
    pub(crate) fn sample_record(driver: &str, distance: f64, duration: f64) -> TripRecord {
        TripRecord {
            id: TripId::new(),
            date: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
            road_type: RoadType::Highway,
            day_night: DayNight::Day,
            vin: None,
            driver_name: driver.to_string(),
            driver_license: None,
            country: Some("USA".to_string()),
            city: None,
            total_distance: distance,
            total_duration: duration,
            avg_speed: average_speed(distance, duration),
        }
    }

    #[test]
    fn test_trip_ids_are_unique() {
        let ids: std::collections::HashSet<TripId> = (0..1000).map(|_| TripId::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_trip_id_parse_roundtrip() {
        let id = TripId::new();
        let parsed: TripId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-an-id".parse::<TripId>().is_err());
    }

    #[test]
    fn test_road_type_parse() {
        assert_eq!("Highway".parse::<RoadType>().unwrap(), RoadType::Highway);
        assert_eq!(" city ".parse::<RoadType>().unwrap(), RoadType::City);
        assert!("offroad".parse::<RoadType>().is_err());
    }

    #[test]
    fn test_day_night_parse() {
        assert_eq!("NIGHT".parse::<DayNight>().unwrap(), DayNight::Night);
        assert!("dusk".parse::<DayNight>().is_err());
    }

    #[test]
    fn test_average_speed_zero_duration() {
        assert!((average_speed(100.0, 2.0) - 50.0).abs() < f64::EPSILON);
        assert!(average_speed(100.0, 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_location_fallbacks() {
        let mut record = sample_record("Ann", 1.0, 1.0);
        assert_eq!(record.location(), "N/A, USA");
        record.city = Some("Austin".to_string());
        assert_eq!(record.location(), "Austin, USA");
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = sample_record("Ann", 10.0, 0.5);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["driverName"], "Ann");
        assert_eq!(json["roadType"], "highway");
        assert_eq!(json["dayNight"], "day");
        assert_eq!(json["date"], "2025-01-05");
        assert_eq!(json["totalDistance"], 10.0);
        assert!(json.get("vin").is_none());
    }

    #[test]
    fn test_record_deserializes_without_optionals() {
        let json = format!(
            r#"{{"id":"{}","date":"2024-12-31","roadType":"rural","dayNight":"night",
                "driverName":"Bo","totalDistance":3.5,"totalDuration":0.25,"avgSpeed":14.0}}"#,
            TripId::new()
        );
        let record: TripRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record.road_type, RoadType::Rural);
        assert!(record.city.is_none());
        assert!((record.avg_speed - 14.0).abs() < f64::EPSILON);
    }
}
