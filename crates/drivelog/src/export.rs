//! Export codecs for the drive log.
//!
//! All functions here are pure: they read records and return text. Each one
//! refuses an empty log with [`Error::EmptyCollection`] so that "nothing to
//! export" is never confused with a valid empty file.

use std::fmt::Write as _;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::{Error, Result};
use crate::record::TripRecord;
use crate::stats::AggregateStats;

/// CSV header, in column order.
pub const CSV_HEADER: [&str; 11] = [
    "Date",
    "Driver Name",
    "Driver License",
    "Distance (mi)",
    "Duration (hrs)",
    "Avg Speed (mph)",
    "Road Type",
    "Day/Night",
    "City",
    "Country",
    "VIN",
];

/// Line drawn under each trip in the email summary.
pub const EMAIL_DIVIDER: &str = "-------------------";

/// Machine-readable export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values, every cell quoted.
    Csv,
    /// Indented JSON array of full records.
    Json,
}

impl ExportFormat {
    /// Default file name for this format.
    #[must_use]
    pub fn filename(self) -> &'static str {
        match self {
            Self::Csv => "vehicle-logs.csv",
            Self::Json => "vehicle-logs.json",
        }
    }

    /// MIME type for this format.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Json => "application/json",
        }
    }

    /// Encode `records` in this format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCollection`] for an empty log, or an encoding error.
    pub fn encode(self, records: &[TripRecord]) -> Result<String> {
        match self {
            Self::Csv => to_csv(records),
            Self::Json => to_json(records),
        }
    }
}

fn ensure_not_empty(records: &[TripRecord], operation: &'static str) -> Result<()> {
    if records.is_empty() {
        Err(Error::EmptyCollection { operation })
    } else {
        Ok(())
    }
}

fn csv_row(record: &TripRecord) -> [String; 11] {
    [
        record.date.to_string(),
        record.driver_name.clone(),
        record.driver_license.clone().unwrap_or_default(),
        format!("{:.1}", record.total_distance),
        format!("{:.2}", record.total_duration),
        format!("{:.1}", record.avg_speed),
        record.road_type.to_string(),
        record.day_night.to_string(),
        record.city.clone().unwrap_or_default(),
        record.country.clone().unwrap_or_default(),
        record.vin.clone().unwrap_or_default(),
    ]
}

/// Serialize `records` to CSV.
///
/// Header first, then one row per record in log order. Every cell is
/// double-quoted, rows are separated by `\n` and there is no trailing
/// newline.
///
/// # Errors
///
/// Returns [`Error::EmptyCollection`] for an empty log.
pub fn to_csv(records: &[TripRecord]) -> Result<String> {
    ensure_not_empty(records, "export")?;

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record(csv_row(record))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::internal(format!("flushing CSV buffer: {e}")))?;
    let mut text =
        String::from_utf8(bytes).map_err(|e| Error::internal(format!("CSV is not UTF-8: {e}")))?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Serialize `records` to indented JSON, preserving order and field names.
///
/// # Errors
///
/// Returns [`Error::EmptyCollection`] for an empty log.
pub fn to_json(records: &[TripRecord]) -> Result<String> {
    ensure_not_empty(records, "export")?;
    Ok(serde_json::to_string_pretty(records)?)
}

/// Human-readable summary for an email body.
///
/// An optional operator message comes first, then the totals, then one
/// block per trip closed by [`EMAIL_DIVIDER`].
///
/// # Errors
///
/// Returns [`Error::EmptyCollection`] for an empty log.
pub fn to_email_summary(
    records: &[TripRecord],
    stats: &AggregateStats,
    message: Option<&str>,
) -> Result<String> {
    ensure_not_empty(records, "email")?;

    let mut body = String::new();
    if let Some(message) = message.map(str::trim).filter(|m| !m.is_empty()) {
        body.push_str(message);
        body.push_str("\n\n");
    }

    // Writing to a String cannot fail.
    let _ = write!(
        body,
        "Vehicle Drive Logs Summary:\n\n\
         Total Trips: {}\n\
         Total Distance: {:.1} mi\n\
         Total Duration: {:.1} hrs\n\
         Average Speed: {:.1} mph\n",
        stats.trip_count, stats.total_distance, stats.total_duration, stats.avg_speed
    );

    for (index, record) in records.iter().enumerate() {
        let _ = write!(
            body,
            "\nLog {}:\n\
             Date: {}\n\
             Driver: {}\n\
             Distance: {:.1} mi\n\
             Duration: {:.2} hrs\n\
             Avg Speed: {:.1} mph\n\
             Road Type: {}\n\
             Time: {}\n\
             Location: {}\n",
            index + 1,
            record.date,
            record.driver_name,
            record.total_distance,
            record.total_duration,
            record.avg_speed,
            record.road_type,
            record.day_night,
            record.location(),
        );
        if let Some(vin) = &record.vin {
            let _ = writeln!(body, "VIN: {vin}");
        }
        body.push_str(EMAIL_DIVIDER);
        body.push('\n');
    }

    Ok(body)
}
