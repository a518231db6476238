//! Boundaries between the drive logger core and the outside world.
//!
//! The core never touches a terminal, a file picker or a mail client
//! directly. It talks to these traits, and the binary (or a test) plugs in
//! concrete adapters.

use std::fmt;

use crate::error::Result;

/// Key-value blob persistence.
///
/// The whole log is stored as one text blob under a fixed key.
pub trait BlobStore {
    /// Read the blob stored under `key`, or `None` if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replace the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be written.
    fn save(&self, key: &str, text: &str) -> Result<()>;
}

/// Label shown next to the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    /// No trip in progress.
    Ready,
    /// The timer is running.
    InProgress,
    /// The timer stopped and the trip form is waiting.
    Finished,
}

impl TimerStatus {
    /// Operator-facing label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Ready => "Ready to start",
            Self::InProgress => "Trip in progress...",
            Self::Finished => "Trip finished - Add details below",
        }
    }
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One-way sink for the timer display.
///
/// Ticks are delivered from the timer's background task, hence `Send + Sync`.
pub trait DisplaySink: Send + Sync {
    /// Show a formatted elapsed time (`HH:MM:SS`).
    fn show_elapsed(&self, text: &str);

    /// Show a state-transition label.
    fn show_status(&self, status: TimerStatus);
}

/// Yes/no question put to the operator before destructive actions.
pub trait ConfirmGate {
    /// Ask `message`; `true` means the operator agreed.
    fn confirm(&self, message: &str) -> bool;
}

/// Which route a delivered file took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryRoute {
    /// Handed to a share target.
    Shared,
    /// Saved as a download.
    Downloaded,
}

/// Hands an exported file to the operator.
pub trait FileDelivery {
    /// Deliver `content` under `filename`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Delivery`](crate::Error::Delivery) if the file could
    /// not be handed over, including when the operator cancelled.
    fn deliver(&self, content: &str, filename: &str, mime_type: &str) -> Result<DeliveryRoute>;
}

/// Opens an external mail composer. Fire-and-forget.
pub trait MailComposer {
    /// Compose a message to `recipient`.
    ///
    /// # Errors
    ///
    /// Returns an error if the composer could not be opened.
    fn compose(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

/// Severity of an operator notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    /// Operation completed.
    Success,
    /// Neutral information.
    Info,
    /// Operation failed; the application is still usable.
    Error,
}

/// A short message for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub level: NotificationLevel,
    /// Text to show.
    pub message: String,
}

impl Notification {
    /// A success notification.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    /// An informational notification.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    /// An error notification.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Receives operator notifications.
pub trait Notifier {
    /// Show `notification`.
    fn notify(&self, notification: Notification);
}
