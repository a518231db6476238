//! Application facade.
//!
//! [`App`] owns the drive log, the trip session and the outward-facing
//! ports. Every operation reports its outcome to the [`Notifier`] and also
//! returns it, so a front end can either react to notifications or inspect
//! the result directly.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::error::{Error, Result};
use crate::export::{to_email_summary, ExportFormat};
use crate::ports::{
    BlobStore, ConfirmGate, DeliveryRoute, DisplaySink, FileDelivery, MailComposer, Notification,
    Notifier,
};
use crate::record::{TripId, TripRecord};
use crate::session::{SessionState, TripForm, TripSession};
use crate::stats::AggregateStats;
use crate::store::{DeleteOutcome, LogStore, SaveStatus};
use crate::timer::Clock;
use crate::view::{render, LogView};

/// Notification texts.
pub mod messages {
    /// A trip was committed.
    pub const ENTRY_ADDED: &str = "Log entry added successfully!";
    /// A trip was deleted.
    pub const ENTRY_DELETED: &str = "Log entry deleted";
    /// The saved log could not be read.
    pub const LOAD_FAILED: &str = "Error loading saved logs";
    /// The log could not be written back.
    pub const SAVE_FAILED: &str = "Error saving data";
    /// Export requested on an empty log.
    pub const NOTHING_TO_EXPORT: &str = "No logs to export";
    /// Email requested on an empty log.
    pub const NOTHING_TO_EMAIL: &str = "No logs to email";
    /// Email requested without a recipient.
    pub const RECIPIENT_REQUIRED: &str = "Please enter recipient email";
    /// Export handed to the share target.
    pub const SHARED: &str = "Saved / Shared successfully!";
    /// Export saved as a download.
    pub const DOWNLOADED: &str = "Downloaded successfully!";
    /// Mail draft handed to the composer.
    pub const COMPOSER_OPENED: &str = "Opening email client...";
}

/// Subject used when an email request leaves it blank.
pub const DEFAULT_EMAIL_SUBJECT: &str = "Vehicle Drive Logs";

/// Settings the facade needs from configuration.
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Blob key the log is stored under.
    pub storage_key: String,
    /// Timer display period.
    pub tick_interval: Duration,
    /// Subject used when an email request has none.
    pub default_subject: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            storage_key: "vehicleLogs".to_string(),
            tick_interval: crate::timer::DEFAULT_TICK_INTERVAL,
            default_subject: DEFAULT_EMAIL_SUBJECT.to_string(),
        }
    }
}

/// Concrete adapters for every port.
pub struct Ports {
    /// Time source for the timer and today's date.
    pub clock: Arc<dyn Clock>,
    /// Timer display.
    pub display: Arc<dyn DisplaySink>,
    /// Operator notifications.
    pub notifier: Box<dyn Notifier>,
    /// Export delivery.
    pub delivery: Box<dyn FileDelivery>,
    /// Mail composer.
    pub mail: Box<dyn MailComposer>,
}

impl fmt::Debug for Ports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ports")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// An email request as entered by the operator.
#[derive(Debug, Clone, Default)]
pub struct EmailRequest {
    /// Recipient address.
    pub recipient: String,
    /// Subject; blank uses the configured default.
    pub subject: Option<String>,
    /// Optional message placed above the summary.
    pub message: Option<String>,
}

/// The drive logger with all of its state.
pub struct App<S: BlobStore> {
    store: LogStore<S>,
    session: TripSession,
    notifier: Box<dyn Notifier>,
    delivery: Box<dyn FileDelivery>,
    mail: Box<dyn MailComposer>,
    default_subject: String,
}

impl<S: BlobStore + fmt::Debug> fmt::Debug for App<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("store", &self.store)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl<S: BlobStore> App<S> {
    /// Load the log from `backend` and wire up the ports.
    ///
    /// An unreadable saved log is reported through the notifier and the app
    /// starts with an empty log.
    pub fn open(backend: S, settings: AppSettings, ports: Ports) -> Self {
        let loaded = LogStore::load(backend, settings.storage_key);
        if loaded.warning.is_some() {
            ports.notifier.notify(Notification::error(messages::LOAD_FAILED));
        }

        let session = TripSession::new(ports.clock, ports.display, settings.tick_interval);
        Self {
            store: loaded.store,
            session,
            notifier: ports.notifier,
            delivery: ports.delivery,
            mail: ports.mail,
            default_subject: settings.default_subject,
        }
    }

    /// Records, newest first.
    #[must_use]
    pub fn records(&self) -> &[TripRecord] {
        self.store.all()
    }

    /// Current aggregate statistics.
    #[must_use]
    pub fn stats(&self) -> AggregateStats {
        self.store.stats()
    }

    /// The drive log.
    #[must_use]
    pub fn store(&self) -> &LogStore<S> {
        &self.store
    }

    /// The trip session.
    #[must_use]
    pub fn session(&self) -> &TripSession {
        &self.session
    }

    /// Session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Display projection of the log.
    #[must_use]
    pub fn view(&self) -> LogView {
        render(self.store.all(), &self.store.stats())
    }

    /// Start the trip timer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] while a stopped trip is pending.
    pub fn start_trip(&mut self) -> Result<()> {
        self.session.start().map_err(|e| self.report(e))
    }

    /// Stop the trip timer and open the form.
    pub fn stop_trip(&mut self) {
        self.session.stop();
    }

    /// Start or stop, whichever applies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] while a stopped trip is pending.
    pub fn toggle_trip(&mut self) -> Result<()> {
        self.session.toggle().map_err(|e| self.report(e))
    }

    /// The pending trip form.
    pub fn form_mut(&mut self) -> Option<&mut TripForm> {
        self.session.form_mut()
    }

    /// Commit the pending form.
    ///
    /// # Errors
    ///
    /// Returns the validation or state error; the form stays pending.
    pub fn submit(&mut self) -> Result<TripId> {
        let submitted = self
            .session
            .submit(&mut self.store)
            .map_err(|e| report(self.notifier.as_ref(), e))?;
        self.report_save(&submitted.save);
        self.notifier
            .notify(Notification::success(messages::ENTRY_ADDED));
        info!(id = %submitted.id, trips = self.store.len(), "Log entry added");
        Ok(submitted.id)
    }

    /// Drop the pending form and reset the timer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] while the timer is running.
    pub fn discard(&mut self) -> Result<()> {
        self.session.discard().map_err(|e| self.report(e))
    }

    /// Delete a record after asking `gate`. Returns whether the delete went
    /// ahead.
    pub fn delete(&mut self, id: TripId, gate: &dyn ConfirmGate) -> bool {
        match self.store.delete(id, gate) {
            DeleteOutcome::Cancelled => false,
            DeleteOutcome::Deleted { save, .. } => {
                self.report_save(&save);
                self.notifier
                    .notify(Notification::success(messages::ENTRY_DELETED));
                true
            }
        }
    }

    /// Encode the log and hand it to the delivery chain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCollection`] for an empty log, or the delivery
    /// failure.
    pub fn export(&self, format: ExportFormat) -> Result<DeliveryRoute> {
        if self.store.is_empty() {
            self.notifier
                .notify(Notification::error(messages::NOTHING_TO_EXPORT));
            return Err(Error::EmptyCollection {
                operation: "export",
            });
        }

        let route = format
            .encode(self.store.all())
            .and_then(|content| {
                self.delivery
                    .deliver(&content, format.filename(), format.mime_type())
            })
            .map_err(|e| self.report(e))?;

        let message = match route {
            DeliveryRoute::Shared => messages::SHARED,
            DeliveryRoute::Downloaded => messages::DOWNLOADED,
        };
        self.notifier.notify(Notification::success(message));
        Ok(route)
    }

    /// Build the email summary and open the composer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCollection`], [`Error::MissingRecipient`] or the
    /// composer's error.
    pub fn email(&self, request: &EmailRequest) -> Result<()> {
        if self.store.is_empty() {
            self.notifier
                .notify(Notification::error(messages::NOTHING_TO_EMAIL));
            return Err(Error::EmptyCollection { operation: "email" });
        }

        let recipient = request.recipient.trim();
        if recipient.is_empty() {
            self.notifier
                .notify(Notification::error(messages::RECIPIENT_REQUIRED));
            return Err(Error::MissingRecipient);
        }

        let subject = request
            .subject
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.default_subject);

        let stats = self.store.stats();
        to_email_summary(self.store.all(), &stats, request.message.as_deref())
            .and_then(|body| self.mail.compose(recipient, subject, &body))
            .map_err(|e| self.report(e))?;

        self.notifier
            .notify(Notification::info(messages::COMPOSER_OPENED));
        Ok(())
    }

    fn report(&self, error: Error) -> Error {
        report(self.notifier.as_ref(), error)
    }

    fn report_save(&self, save: &SaveStatus) {
        if !save.is_saved() {
            self.notifier
                .notify(Notification::error(messages::SAVE_FAILED));
        }
    }
}

fn report(notifier: &dyn Notifier, error: Error) -> Error {
    notifier.notify(Notification::error(error.to_string()));
    error
}
