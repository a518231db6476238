//! Terminal adapters for the ports, plus line-based form prompting.

use std::io::{self, BufRead, Write};

use crate::app::App;
use crate::error::{Error, Result, ValidationErrors};
use crate::ports::{
    BlobStore, ConfirmGate, DisplaySink, Notification, NotificationLevel, Notifier, TimerStatus,
};
use crate::record::{DayNight, RoadType, TripId};
use crate::session::TripForm;

/// Answer that empties a field instead of keeping its current value.
pub const CLEAR_MARKER: &str = "-";

const INPUT_ENDED: &str = "Input ended; trip discarded.";

/// Draws the timer on stdout, rewriting the current line on each tick.
#[derive(Debug, Default)]
pub struct TerminalDisplay;

impl DisplaySink for TerminalDisplay {
    fn show_elapsed(&self, text: &str) {
        let mut out = io::stdout().lock();
        let _ = write!(out, "\r  {text}  ");
        let _ = out.flush();
    }

    fn show_status(&self, status: TimerStatus) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "\r{status}");
    }
}

/// Prints notifications on stderr.
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        let marker = match notification.level {
            NotificationLevel::Success => "✓",
            NotificationLevel::Info => "•",
            NotificationLevel::Error => "✗",
        };
        eprintln!("{marker} {}", notification.message);
    }
}

/// Asks on the terminal; anything but `y`/`yes` declines.
#[derive(Debug, Default)]
pub struct TerminalConfirm;

impl ConfirmGate for TerminalConfirm {
    fn confirm(&self, message: &str) -> bool {
        let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
        prompter.confirm(message).unwrap_or(false)
    }
}

/// Confirms without asking, for `--yes`.
#[derive(Debug, Default)]
pub struct AssumeYes;

impl ConfirmGate for AssumeYes {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

/// How an interactive trip ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripOutcome {
    /// Saved under this id.
    Saved(TripId),
    /// Dropped by the operator or because input ended.
    Discarded,
}

/// Line-oriented prompts over any reader and writer.
#[derive(Debug)]
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Prompt on `output`, read answers from `input`.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    /// Ask for a value, showing `current` as the default. An empty answer
    /// keeps the default and [`CLEAR_MARKER`] empties it. Returns `None` at
    /// end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read or written.
    pub fn ask(&mut self, label: &str, current: &str) -> io::Result<Option<String>> {
        if current.is_empty() {
            write!(self.output, "{label}: ")?;
        } else {
            write!(self.output, "{label} [{current}]: ")?;
        }
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(match line.trim() {
            "" => current.to_string(),
            CLEAR_MARKER => String::new(),
            answer => answer.to_string(),
        }))
    }

    /// Wait for the operator to press Enter. Returns `false` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    pub fn wait_for_enter(&mut self) -> io::Result<bool> {
        let mut line = String::new();
        Ok(self.input.read_line(&mut line)? > 0)
    }

    /// Ask a yes/no question, defaulting to no.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read or written.
    pub fn confirm(&mut self, message: &str) -> io::Result<bool> {
        let answer = self.ask(&format!("{message} (y/N)"), "")?;
        Ok(matches!(
            answer.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("y" | "yes")
        ))
    }

    /// Walk through every form field. Returns `false` if input ended early.
    ///
    /// Distance is asked before average speed so the derived speed can be
    /// offered as the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read or written.
    pub fn fill_form(&mut self, form: &mut TripForm) -> io::Result<bool> {
        writeln!(
            self.output,
            "Enter keeps the value in brackets; '{CLEAR_MARKER}' clears it."
        )?;
        let road_types = choices(RoadType::ALL.iter().map(|r| r.as_str()));
        let day_night = choices(DayNight::ALL.iter().map(|d| d.as_str()));

        macro_rules! text_field {
            ($label:expr, $field:expr) => {
                match self.ask($label, &$field)? {
                    Some(value) => $field = value,
                    None => return Ok(false),
                }
            };
        }

        text_field!("Date (YYYY-MM-DD)", form.date);
        text_field!("Driver name", form.driver_name);
        text_field!("Driver license", form.driver_license);
        text_field!("VIN", form.vin);
        text_field!(&format!("Road type ({road_types})"), form.road_type);
        text_field!(&format!("Day or night ({day_night})"), form.day_night);
        text_field!("City", form.city);
        text_field!("Country", form.country);

        let Some(duration) = self.ask("Duration (hrs)", form.duration())? else {
            return Ok(false);
        };
        form.set_duration(duration);

        let Some(distance) = self.ask("Distance (mi)", form.distance())? else {
            return Ok(false);
        };
        form.set_distance(distance);

        let Some(speed) = self.ask("Avg speed (mph)", form.avg_speed())? else {
            return Ok(false);
        };
        form.set_avg_speed(speed);

        Ok(true)
    }

    /// Time a trip on `app`, then prompt for its details until they validate
    /// or the operator gives up. With `manual` the timer is stopped straight
    /// away instead of waiting for Enter.
    ///
    /// End of input at any prompt discards the trip.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal fails or the session rejects a step.
    pub fn run_trip<S: BlobStore>(
        &mut self,
        app: &mut App<S>,
        manual: bool,
    ) -> Result<TripOutcome> {
        app.start_trip()?;
        let arrived = if manual {
            true
        } else {
            self.say("Press Enter to stop the trip.")?;
            self.wait_for_enter()?
        };
        app.stop_trip();
        if !arrived {
            return self.abandon(app, INPUT_ENDED);
        }

        while let Some(form) = app.form_mut() {
            if !self.fill_form(form)? {
                return self.abandon(app, INPUT_ENDED);
            }

            match app.submit() {
                Ok(id) => {
                    self.say(&format!("Saved trip {id}"))?;
                    return Ok(TripOutcome::Saved(id));
                }
                Err(Error::Validation(errors)) => {
                    self.show_errors(&errors)?;
                    if !self.confirm("Edit the details again?")? {
                        return self.abandon(app, "Trip discarded.");
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Ok(TripOutcome::Discarded)
    }

    fn abandon<S: BlobStore>(&mut self, app: &mut App<S>, message: &str) -> Result<TripOutcome> {
        app.discard()?;
        self.say(message)?;
        Ok(TripOutcome::Discarded)
    }

    /// Print each validation problem on its own line.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn show_errors(&mut self, errors: &ValidationErrors) -> io::Result<()> {
        for error in errors.errors() {
            writeln!(self.output, "  - {error}")?;
        }
        Ok(())
    }
}

fn choices<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.collect::<Vec<_>>().join("/")
}
