//! The drive log: an ordered, persisted collection of trip records.
//!
//! Records are kept newest first. Every mutation recomputes the aggregate
//! statistics from the full collection and writes the whole collection back
//! through the [`BlobStore`].

use std::collections::HashSet;

use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::ports::{BlobStore, ConfirmGate};
use crate::record::{TripId, TripRecord};
use crate::stats::{compute_stats, AggregateStats};

/// Question put to the operator before a record is deleted.
pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this log entry?";

/// Result of writing the collection back to storage.
///
/// A failed save never undoes the in-memory change.
#[derive(Debug)]
pub enum SaveStatus {
    /// The collection was written.
    Saved,
    /// The write failed; the in-memory log is still updated.
    Failed(Error),
}

impl SaveStatus {
    /// Whether the write succeeded.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }
}

/// Result of a delete request.
#[derive(Debug)]
pub enum DeleteOutcome {
    /// The operator declined; nothing changed.
    Cancelled,
    /// The delete went ahead.
    Deleted {
        /// How many records matched the id (0 or 1 in practice).
        removed: usize,
        /// Whether the collection was written back.
        save: SaveStatus,
    },
}

/// A freshly loaded log plus any problem hit while reading it.
#[derive(Debug)]
pub struct Loaded<S: BlobStore> {
    /// The log, empty if nothing usable was stored.
    pub store: LogStore<S>,
    /// Why the stored log was ignored, if it was.
    pub warning: Option<Error>,
}

/// In-memory drive log backed by a blob store.
#[derive(Debug)]
pub struct LogStore<S: BlobStore> {
    backend: S,
    key: String,
    records: Vec<TripRecord>,
    stats: AggregateStats,
}

impl<S: BlobStore> LogStore<S> {
    /// Load the log stored under `key`.
    ///
    /// Never fails: a missing blob yields an empty log, and an unreadable or
    /// malformed one yields an empty log plus a warning.
    pub fn load(backend: S, key: impl Into<String>) -> Loaded<S> {
        let key = key.into();
        let (records, warning) = match backend.load(&key) {
            Ok(None) => {
                debug!(key = %key, "No saved logs yet");
                (Vec::new(), None)
            }
            Ok(Some(text)) => match serde_json::from_str::<Vec<TripRecord>>(&text) {
                Ok(records) => (dedupe(records), None),
                Err(e) => {
                    warn!(error = %e, "Saved logs are malformed; starting empty");
                    (Vec::new(), Some(Error::load_failed(e.to_string())))
                }
            },
            Err(e) => {
                warn!(error = %e, "Could not read saved logs; starting empty");
                (Vec::new(), Some(e))
            }
        };

        let stats = compute_stats(&records);
        info!(trips = records.len(), "Drive log loaded");
        Loaded {
            store: Self {
                backend,
                key,
                records,
                stats,
            },
            warning,
        }
    }

    /// Records, newest first.
    #[must_use]
    pub fn all(&self) -> &[TripRecord] {
        &self.records
    }

    /// Look up a record by id.
    #[must_use]
    pub fn get(&self, id: TripId) -> Option<&TripRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Aggregate statistics as of the last mutation.
    #[must_use]
    pub fn stats(&self) -> AggregateStats {
        self.stats
    }

    /// The persistence backend.
    #[must_use]
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Prepend `record`, recompute statistics and save.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateId`] if a record with the same id exists; the
    /// log is left untouched in that case. Save failures are reported through
    /// the returned [`SaveStatus`] instead.
    pub fn add(&mut self, record: TripRecord) -> Result<SaveStatus> {
        if self.get(record.id).is_some() {
            return Err(Error::DuplicateId {
                id: record.id.to_string(),
            });
        }
        debug!(id = %record.id, driver = %record.driver_name, "Adding log entry");
        self.records.insert(0, record);
        Ok(self.commit())
    }

    /// Delete every record with `id` once `gate` confirms.
    ///
    /// A confirmed delete always recomputes and saves, even when no record
    /// matched.
    pub fn delete(&mut self, id: TripId, gate: &dyn ConfirmGate) -> DeleteOutcome {
        if !gate.confirm(DELETE_CONFIRMATION) {
            debug!(id = %id, "Delete cancelled");
            return DeleteOutcome::Cancelled;
        }

        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        let removed = before - self.records.len();
        debug!(id = %id, removed, "Deleted log entries");

        DeleteOutcome::Deleted {
            removed,
            save: self.commit(),
        }
    }

    fn commit(&mut self) -> SaveStatus {
        self.stats = compute_stats(&self.records);

        let saved = serde_json::to_string(&self.records)
            .map_err(Error::from)
            .and_then(|text| self.backend.save(&self.key, &text));

        match saved {
            Ok(()) => SaveStatus::Saved,
            Err(e) => {
                error!(error = %e, "Error saving to storage");
                SaveStatus::Failed(e)
            }
        }
    }
}

/// Drop records whose id was already seen, keeping the first (newest).
fn dedupe(records: Vec<TripRecord>) -> Vec<TripRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    let total = records.len();
    let unique: Vec<TripRecord> = records.into_iter().filter(|r| seen.insert(r.id)).collect();
    if unique.len() != total {
        warn!(
            dropped = total - unique.len(),
            "Dropped saved log entries with duplicate ids"
        );
    }
    unique
}
