//! Trip capture session: timer, trip form and commit into the log.
//!
//! ```text
//! Idle --start--> Running --stop--> PendingDetails --submit--> Idle
//!                                         |
//!                                         +------discard-----> Idle
//! ```
//!
//! Stopping the timer opens a [`TripForm`] with the measured duration
//! pre-filled. Submitting validates the form, appends the record to the
//! [`LogStore`] and resets the timer.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use tracing::debug;

use crate::error::{Error, FormField, Result, ValidationErrors};
use crate::ports::{BlobStore, DisplaySink, TimerStatus};
use crate::record::{average_speed, DayNight, RoadType, TripId, TripRecord};
use crate::store::{LogStore, SaveStatus};
use crate::timer::{Clock, Timer};

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Date format of the form's date field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Where the session is in the capture cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for a trip to start.
    Idle,
    /// The timer is running.
    Running,
    /// The timer stopped; the trip form is waiting to be submitted.
    PendingDetails,
}

impl SessionState {
    fn describe(self) -> &'static str {
        match self {
            Self::Idle => "no trip is in progress",
            Self::Running => "a trip is in progress",
            Self::PendingDetails => "trip details are pending",
        }
    }
}

/// Parse a user-typed number, ignoring surrounding whitespace.
///
/// Non-finite values (`inf`, `NaN`) are not numbers here.
#[must_use]
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Hours in `ms`, formatted to two decimals.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_duration_hours(ms: u64) -> String {
    format!("{:.2}", ms as f64 / MS_PER_HOUR)
}

/// Raw text of the trip details form.
///
/// Distance, duration and average speed are kept behind setters so the
/// average speed can follow the other two as they are typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripForm {
    /// Trip date (`YYYY-MM-DD`).
    pub date: String,
    /// Road type (`highway`, `city`, `rural`, `mixed`).
    pub road_type: String,
    /// `day` or `night`.
    pub day_night: String,
    /// Vehicle identification number.
    pub vin: String,
    /// Driver name (required).
    pub driver_name: String,
    /// Driver's license number.
    pub driver_license: String,
    /// Country.
    pub country: String,
    /// City.
    pub city: String,
    distance: String,
    duration: String,
    avg_speed: String,
}

impl TripForm {
    /// A blank form dated `today`.
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date: today.format(DATE_FORMAT).to_string(),
            road_type: String::new(),
            day_night: String::new(),
            vin: String::new(),
            driver_name: String::new(),
            driver_license: String::new(),
            country: String::new(),
            city: String::new(),
            distance: String::new(),
            duration: String::new(),
            avg_speed: String::new(),
        }
    }

    /// Distance text (miles).
    #[must_use]
    pub fn distance(&self) -> &str {
        &self.distance
    }

    /// Duration text (hours).
    #[must_use]
    pub fn duration(&self) -> &str {
        &self.duration
    }

    /// Average speed text (mph).
    #[must_use]
    pub fn avg_speed(&self) -> &str {
        &self.avg_speed
    }

    /// Set the distance and refresh the derived average speed.
    pub fn set_distance(&mut self, text: impl Into<String>) {
        self.distance = text.into();
        self.refresh_avg_speed();
    }

    /// Set the duration and refresh the derived average speed.
    pub fn set_duration(&mut self, text: impl Into<String>) {
        self.duration = text.into();
        self.refresh_avg_speed();
    }

    /// Override the average speed.
    pub fn set_avg_speed(&mut self, text: impl Into<String>) {
        self.avg_speed = text.into();
    }

    /// Recompute average speed, but only when the duration is a positive
    /// number. An unreadable distance counts as zero.
    fn refresh_avg_speed(&mut self) {
        let Some(duration) = parse_number(&self.duration).filter(|d| *d > 0.0) else {
            return;
        };
        let distance = parse_number(&self.distance).unwrap_or(0.0);
        self.avg_speed = format!("{:.1}", distance / duration);
    }

    /// Check every field and build a record with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] listing every problem found.
    pub fn to_record(&self, id: TripId) -> Result<TripRecord> {
        let mut errors = ValidationErrors::new();

        let date = match self.date.trim() {
            "" => {
                errors.push(FormField::Date, "is required");
                None
            }
            text => NaiveDate::parse_from_str(text, DATE_FORMAT)
                .map_err(|_| errors.push(FormField::Date, "must be a date like 2025-01-31"))
                .ok(),
        };

        let road_type =
            required_choice::<RoadType>(&self.road_type, FormField::RoadType, &mut errors);
        let day_night =
            required_choice::<DayNight>(&self.day_night, FormField::DayNight, &mut errors);

        let driver_name = self.driver_name.trim();
        if driver_name.is_empty() {
            errors.push(FormField::DriverName, "is required");
        }

        let distance = required_number(&self.distance, FormField::Distance, &mut errors);
        let duration = required_number(&self.duration, FormField::Duration, &mut errors);

        let avg_speed = if self.avg_speed.trim().is_empty() {
            None
        } else {
            let speed = parse_number(&self.avg_speed);
            if speed.is_none() {
                errors.push(FormField::AvgSpeed, "must be a number");
            }
            speed
        };

        errors.into_result()?;

        match (date, road_type, day_night, distance, duration) {
            (Some(date), Some(road_type), Some(day_night), Some(distance), Some(duration)) => {
                Ok(TripRecord {
                    id,
                    date,
                    road_type,
                    day_night,
                    vin: optional(&self.vin),
                    driver_name: driver_name.to_string(),
                    driver_license: optional(&self.driver_license),
                    country: optional(&self.country),
                    city: optional(&self.city),
                    total_distance: distance,
                    total_duration: duration,
                    avg_speed: avg_speed.unwrap_or_else(|| average_speed(distance, duration)),
                })
            }
            _ => Err(Error::internal("form validated without all required values")),
        }
    }
}

fn optional(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn required_choice<T>(text: &str, field: FormField, errors: &mut ValidationErrors) -> Option<T>
where
    T: std::str::FromStr<Err = String>,
{
    if text.trim().is_empty() {
        errors.push(field, "is required");
        return None;
    }
    text.parse::<T>().map_err(|e| errors.push(field, e)).ok()
}

fn required_number(text: &str, field: FormField, errors: &mut ValidationErrors) -> Option<f64> {
    if text.trim().is_empty() {
        errors.push(field, "is required");
        return None;
    }
    match parse_number(text) {
        Some(value) if value >= 0.0 => Some(value),
        Some(_) => {
            errors.push(field, "must not be negative");
            None
        }
        None => {
            errors.push(field, "must be a number");
            None
        }
    }
}

/// A committed trip.
#[derive(Debug)]
pub struct Submitted {
    /// Id of the new record.
    pub id: TripId,
    /// Whether the log was written back.
    pub save: SaveStatus,
}

/// Drives one trip at a time through timer, form and commit.
pub struct TripSession {
    timer: Timer,
    clock: Arc<dyn Clock>,
    display: Arc<dyn DisplaySink>,
    state: SessionState,
    form: Option<TripForm>,
}

impl fmt::Debug for TripSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TripSession")
            .field("timer", &self.timer)
            .field("state", &self.state)
            .field("form", &self.form)
            .finish_non_exhaustive()
    }
}

impl TripSession {
    /// Create an idle session. The display is told the timer is ready.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        display: Arc<dyn DisplaySink>,
        tick_interval: Duration,
    ) -> Self {
        let timer = Timer::new(Arc::clone(&clock), Arc::clone(&display), tick_interval);
        display.show_status(TimerStatus::Ready);
        Self {
            timer,
            clock,
            display,
            state: SessionState::Idle,
            form: None,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The pending form, if the timer has been stopped.
    #[must_use]
    pub fn form(&self) -> Option<&TripForm> {
        self.form.as_ref()
    }

    /// Mutable access to the pending form.
    pub fn form_mut(&mut self) -> Option<&mut TripForm> {
        self.form.as_mut()
    }

    /// The underlying timer.
    #[must_use]
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Today's date according to the session clock (UTC).
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        DateTime::from_timestamp_millis(self.clock.now_ms())
            .unwrap_or_default()
            .date_naive()
    }

    /// Start the timer. No-op while already running.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] while a stopped trip's details
    /// are still pending.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            SessionState::Running => Ok(()),
            SessionState::PendingDetails => Err(self.invalid("start a trip")),
            SessionState::Idle => {
                self.timer.start();
                self.state = SessionState::Running;
                self.display.show_status(TimerStatus::InProgress);
                debug!("Trip started");
                Ok(())
            }
        }
    }

    /// Stop the timer and open the trip form. No-op unless running.
    pub fn stop(&mut self) {
        if self.state != SessionState::Running {
            return;
        }
        self.timer.stop();

        let mut form = TripForm::new(self.today());
        form.set_duration(format_duration_hours(self.timer.elapsed_ms()));
        debug!(duration_hours = %form.duration(), "Trip stopped");

        self.form = Some(form);
        self.state = SessionState::PendingDetails;
        self.display.show_status(TimerStatus::Finished);
    }

    /// Start when idle, stop when running.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] while details are pending.
    pub fn toggle(&mut self) -> Result<()> {
        if self.state == SessionState::Running {
            self.stop();
            Ok(())
        } else {
            self.start()
        }
    }

    /// Validate the pending form and append the trip to `store`.
    ///
    /// On success the timer is reset and the session is idle again. On any
    /// error the session stays in `PendingDetails` with the form intact.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] when no form is pending,
    /// [`Error::Validation`] for bad fields, or [`Error::DuplicateId`].
    pub fn submit<S: BlobStore>(&mut self, store: &mut LogStore<S>) -> Result<Submitted> {
        let form = match (&self.state, &self.form) {
            (SessionState::PendingDetails, Some(form)) => form,
            _ => return Err(self.invalid("submit trip details")),
        };

        let record = form.to_record(TripId::new())?;
        let id = record.id;
        let save = store.add(record)?;

        self.finish();
        debug!(id = %id, "Trip committed");
        Ok(Submitted { id, save })
    }

    /// Throw away the pending form and reset the timer. No-op when idle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] while the timer is running.
    pub fn discard(&mut self) -> Result<()> {
        match self.state {
            SessionState::Idle => Ok(()),
            SessionState::Running => Err(self.invalid("discard a trip")),
            SessionState::PendingDetails => {
                self.finish();
                debug!("Trip discarded");
                Ok(())
            }
        }
    }

    fn finish(&mut self) {
        self.timer.reset();
        self.form = None;
        self.state = SessionState::Idle;
        self.display.show_status(TimerStatus::Ready);
    }

    fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidTransition {
            state: self.state.describe(),
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::testing::RecordingDisplay;
    use crate::storage::MemoryBlobStore;
    use crate::timer::ManualClock;

    // 2025-03-10T08:00:00Z
    const T0: i64 = 1_741_593_600_000;

    fn session() -> (TripSession, ManualClock, Arc<RecordingDisplay>) {
        let clock = ManualClock::new(T0);
        let display = Arc::new(RecordingDisplay::default());
        let session = TripSession::new(
            Arc::new(clock.clone()),
            display.clone(),
            Duration::from_millis(100),
        );
        (session, clock, display)
    }

    fn store() -> LogStore<MemoryBlobStore> {
        LogStore::load(MemoryBlobStore::new(), "vehicleLogs").store
    }

    fn fill(form: &mut TripForm) {
        form.driver_name = "Ann".to_string();
        form.road_type = "highway".to_string();
        form.day_night = "day".to_string();
    }

    #[test]
    fn test_new_session_is_idle_and_ready() {
        let (session, _, display) = session();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.form().is_none());
        assert_eq!(display.last_status(), Some(TimerStatus::Ready));
    }

    #[test]
    fn test_timer_scenario_prefills_duration_and_speed() {
        let (mut session, clock, display) = session();

        session.start().unwrap();
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(display.last_status(), Some(TimerStatus::InProgress));

        clock.advance(5_430_000);
        session.stop();

        assert_eq!(session.state(), SessionState::PendingDetails);
        assert_eq!(display.last_status(), Some(TimerStatus::Finished));
        let form = session.form_mut().unwrap();
        assert_eq!(form.duration(), "1.51");
        assert_eq!(form.date, "2025-03-10");

        form.set_distance("100");
        assert_eq!(form.avg_speed(), "66.2");

        fill(form);
        let mut log = store();
        let submitted = session.submit(&mut log).unwrap();

        assert!(submitted.save.is_saved());
        let record = log.get(submitted.id).unwrap();
        assert!((record.total_duration - 1.51).abs() < 1e-12);
        assert!((record.avg_speed - 66.2).abs() < 1e-12);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.timer().elapsed_ms(), 0);
        assert_eq!(display.last_status(), Some(TimerStatus::Ready));
    }

    #[test]
    fn test_avg_speed_not_touched_without_duration() {
        let mut form = TripForm::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        form.set_avg_speed("55");
        form.set_distance("10");
        assert_eq!(form.avg_speed(), "55");

        form.set_duration("0");
        assert_eq!(form.avg_speed(), "55");

        form.set_duration("abc");
        assert_eq!(form.avg_speed(), "55");

        form.set_duration("0.5");
        assert_eq!(form.avg_speed(), "20.0");

        form.set_distance("not a number");
        assert_eq!(form.avg_speed(), "0.0");
    }

    #[test]
    fn test_avg_speed_override_is_stored() {
        let mut form = TripForm::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        fill(&mut form);
        form.set_distance("30");
        form.set_duration("1");
        form.set_avg_speed("42.5");

        let record = form.to_record(TripId::new()).unwrap();
        assert!((record.avg_speed - 42.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_blank_avg_speed_is_derived() {
        let mut form = TripForm::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        fill(&mut form);
        form.set_distance("30");
        form.set_duration("0");

        let record = form.to_record(TripId::new()).unwrap();
        assert_eq!(record.avg_speed, 0.0);
    }

    #[test]
    fn test_validation_reports_each_field() {
        let mut form = TripForm::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        form.date = "31/01/2025".to_string();
        form.road_type = "offroad".to_string();
        form.set_distance("ten");
        form.set_duration("-1");
        form.set_avg_speed("fast");

        let Err(Error::Validation(errors)) = form.to_record(TripId::new()) else {
            panic!("expected validation errors");
        };
        for field in [
            FormField::Date,
            FormField::RoadType,
            FormField::DayNight,
            FormField::DriverName,
            FormField::Distance,
            FormField::Duration,
            FormField::AvgSpeed,
        ] {
            assert!(errors.has(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_optional_fields_are_trimmed() {
        let mut form = TripForm::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        fill(&mut form);
        form.driver_name = "  Ann  ".to_string();
        form.city = "  ".to_string();
        form.country = " Canada ".to_string();
        form.set_distance("1");
        form.set_duration("1");

        let record = form.to_record(TripId::new()).unwrap();
        assert_eq!(record.driver_name, "Ann");
        assert_eq!(record.city, None);
        assert_eq!(record.country.as_deref(), Some("Canada"));
    }

    #[test]
    fn test_invalid_submit_keeps_pending_state() {
        let (mut session, clock, _) = session();
        session.start().unwrap();
        clock.advance(60_000);
        session.stop();

        let mut log = store();
        let err = session.submit(&mut log).unwrap_err();

        assert!(err.is_validation());
        assert_eq!(session.state(), SessionState::PendingDetails);
        assert!(session.form().is_some());
        assert_eq!(session.timer().elapsed_ms(), 60_000);
        assert!(log.is_empty());
    }

    #[test]
    fn test_start_while_pending_is_rejected() {
        let (mut session, _, _) = session();
        session.toggle().unwrap();
        session.toggle().unwrap();
        assert_eq!(session.state(), SessionState::PendingDetails);

        let err = session.start().unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert!(session.toggle().is_err());
    }

    #[test]
    fn test_submit_when_idle_is_rejected() {
        let (mut session, _, _) = session();
        let mut log = store();
        let err = session.submit(&mut log).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot submit trip details while no trip is in progress"
        );
    }

    #[test]
    fn test_discard_returns_to_idle() {
        let (mut session, clock, display) = session();
        session.start().unwrap();
        assert!(session.discard().is_err());

        clock.advance(1_000);
        session.stop();
        session.discard().unwrap();

        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.form().is_none());
        assert_eq!(session.timer().elapsed_ms(), 0);
        assert_eq!(display.last_status(), Some(TimerStatus::Ready));
        assert!(session.discard().is_ok());
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let (mut session, _, _) = session();
        session.stop();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.form().is_none());
    }

    #[test]
    fn test_format_duration_hours() {
        assert_eq!(format_duration_hours(0), "0.00");
        assert_eq!(format_duration_hours(5_430_000), "1.51");
        assert_eq!(format_duration_hours(3_600_000 * 3), "3.00");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number(""), None);
    }
}
