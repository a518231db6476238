//! `drivelog` - A local-first vehicle drive logger
//!
//! Time a trip, record its details, and keep a persisted log with running
//! totals that can be exported as CSV or JSON or summarized for email.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod app;
pub mod cli;
pub mod config;
pub mod delivery;
pub mod error;
pub mod export;
pub mod logging;
pub mod ports;
pub mod record;
pub mod session;
pub mod stats;
pub mod storage;
pub mod store;
pub mod terminal;
pub mod timer;
pub mod view;

pub use app::{App, AppSettings, EmailRequest, Ports};
pub use config::Config;
pub use error::{Error, Result};
pub use export::ExportFormat;
pub use logging::init_logging;
pub use record::{DayNight, RoadType, TripId, TripRecord};
pub use session::{SessionState, TripForm, TripSession};
pub use stats::{compute_stats, AggregateStats};
pub use storage::{MemoryBlobStore, SqliteBlobStore};
pub use store::LogStore;
pub use view::{render, LogView};
