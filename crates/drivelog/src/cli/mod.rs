//! Command-line interface for drivelog.
//!
//! This module provides the CLI structure for the `drivelog` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, DeleteCommand, EmailCommand, ExportCommand, ExportFormatArg, ListCommand,
    StatsCommand, TripCommand,
};

use crate::logging::Verbosity;

/// drivelog - Time and record your drives
///
/// Start a timer when you set off, stop it when you arrive, fill in the
/// details, and keep a local log you can export as CSV or JSON or send as
/// an email summary.
#[derive(Debug, Parser)]
#[command(name = "drivelog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Time a trip and record its details
    Trip(TripCommand),

    /// Show the drive log
    List(ListCommand),

    /// Show totals across all trips
    Stats(StatsCommand),

    /// Delete a log entry
    Delete(DeleteCommand),

    /// Export the log as CSV or JSON
    Export(ExportCommand),

    /// Write an email draft summarizing the log
    Email(EmailCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
