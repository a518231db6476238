//! Error types for drivelog.
//!
//! Every failure a drivelog operation can hit is a variant of [`Error`]. All of
//! them are terminal for the operation that raised them and never for the
//! process: the application facade turns them into notifications.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for drivelog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Persistence Errors ===
    /// Reading or writing the persisted log failed.
    #[error("failed to {operation} drive logs: {message}")]
    Persistence {
        /// Either "load" or "save".
        operation: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Trip Errors ===
    /// The trip form has missing or malformed fields.
    #[error("invalid trip details: {0}")]
    Validation(ValidationErrors),

    /// A record with this id is already in the log.
    #[error("a log entry with id {id} already exists")]
    DuplicateId {
        /// The clashing id.
        id: String,
    },

    /// The trip session cannot perform this action in its current state.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        /// Label of the current session state.
        state: &'static str,
        /// The rejected action.
        action: &'static str,
    },

    // === Export Errors ===
    /// Export or email was requested with no records.
    #[error("no logs to {operation}")]
    EmptyCollection {
        /// The aborted operation ("export", "email").
        operation: &'static str,
    },

    /// An email was requested without a recipient.
    #[error("recipient email is required")]
    MissingRecipient,

    /// Sharing or downloading a file failed or was cancelled.
    #[error("delivery failed: {message}")]
    Delivery {
        /// Description of what went wrong.
        message: String,
    },

    /// CSV encoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for drivelog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl Error {
    /// Create a persistence error for a failed load.
    #[must_use]
    pub fn load_failed(message: impl Into<String>) -> Self {
        Self::Persistence {
            operation: "load",
            message: message.into(),
        }
    }

    /// Create a persistence error for a failed save.
    #[must_use]
    pub fn save_failed(message: impl Into<String>) -> Self {
        Self::Persistence {
            operation: "save",
            message: message.into(),
        }
    }

    /// Create a delivery error.
    #[must_use]
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means there was nothing to export.
    #[must_use]
    pub fn is_empty_collection(&self) -> bool {
        matches!(self, Self::EmptyCollection { .. })
    }

    /// Check if this error is a form validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error came from the persistence layer.
    #[must_use]
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Persistence { .. }
                | Self::DatabaseOpen { .. }
                | Self::DatabaseQuery(_)
                | Self::DatabaseMigration { .. }
        )
    }
}

/// Trip form field a validation problem refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    /// Trip date.
    Date,
    /// Road type.
    RoadType,
    /// Day or night.
    DayNight,
    /// Driver name.
    DriverName,
    /// Total distance.
    Distance,
    /// Total duration.
    Duration,
    /// Average speed.
    AvgSpeed,
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Date => "date",
            Self::RoadType => "road type",
            Self::DayNight => "day/night",
            Self::DriverName => "driver name",
            Self::Distance => "distance",
            Self::Duration => "duration",
            Self::AvgSpeed => "average speed",
        };
        f.write_str(label)
    }
}

/// A single problem with one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// The offending field.
    pub field: FormField,
    /// What is wrong with it.
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All field problems found while validating a trip form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Create an empty error list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem with `field`.
    pub fn push(&mut self, field: FormField, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Whether no problems were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The recorded problems, in field order.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Whether `field` has at least one problem.
    #[must_use]
    pub fn has(&self, field: FormField) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Turn the list into a result: `Ok` when empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if any problem was recorded.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::EmptyCollection {
            operation: "export",
        };
        assert_eq!(err.to_string(), "no logs to export");

        let err = Error::delivery("share cancelled");
        assert_eq!(err.to_string(), "delivery failed: share cancelled");
    }

    #[test]
    fn test_persistence_error_display() {
        assert_eq!(
            Error::load_failed("bad json").to_string(),
            "failed to load drive logs: bad json"
        );
        assert_eq!(
            Error::save_failed("disk full").to_string(),
            "failed to save drive logs: disk full"
        );
    }

    #[test]
    fn test_error_predicates() {
        assert!(Error::EmptyCollection { operation: "email" }.is_empty_collection());
        assert!(!Error::internal("x").is_empty_collection());
        assert!(Error::save_failed("x").is_persistence());
        assert!(!Error::delivery("x").is_persistence());
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = Error::InvalidTransition {
            state: "trip details are pending",
            action: "start a trip",
        };
        assert_eq!(
            err.to_string(),
            "cannot start a trip while trip details are pending"
        );
    }

    #[test]
    fn test_validation_errors_collect() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());
        assert!(errors.clone().into_result().is_ok());

        errors.push(FormField::DriverName, "is required");
        errors.push(FormField::Distance, "must be a number");

        assert!(errors.has(FormField::DriverName));
        assert!(!errors.has(FormField::Duration));
        assert_eq!(errors.errors().len(), 2);

        let err = errors.into_result().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "invalid trip details: driver name: is required; distance: must be a number"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
            assert!(err.is_persistence());
        }
    }

    #[test]
    fn test_duplicate_id_display() {
        let err = Error::DuplicateId {
            id: "abc".to_string(),
        };
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
