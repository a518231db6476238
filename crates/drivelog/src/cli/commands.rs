//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::export::ExportFormat;

/// Interactive trip capture.
#[derive(Debug, Args)]
pub struct TripCommand {
    /// Skip the timer and enter the duration by hand
    #[arg(long)]
    pub manual: bool,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output the full records as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Id of the log entry to delete
    pub id: String,

    /// Delete without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Export format
    #[arg(value_enum)]
    pub format: ExportFormatArg,

    /// Print to stdout instead of saving or sharing
    #[arg(long)]
    pub stdout: bool,
}

/// Export format for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormatArg {
    /// Comma-separated values
    Csv,
    /// JSON array of full records
    Json,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Csv => Self::Csv,
            ExportFormatArg::Json => Self::Json,
        }
    }
}

/// Email command arguments.
#[derive(Debug, Args)]
pub struct EmailCommand {
    /// Recipient email address
    #[arg(long, value_name = "ADDR")]
    pub to: String,

    /// Subject line (defaults to the configured subject)
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Message placed above the summary
    #[arg(short, long)]
    pub message: Option<String>,
}

/// Configuration management commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_conversion() {
        assert_eq!(ExportFormat::from(ExportFormatArg::Csv), ExportFormat::Csv);
        assert_eq!(
            ExportFormat::from(ExportFormatArg::Json),
            ExportFormat::Json
        );
    }

    #[test]
    fn test_export_format_value_names() {
        let names: Vec<String> = ExportFormatArg::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value().map(|p| p.get_name().to_string()))
            .collect();
        assert_eq!(names, ["csv", "json"]);
    }
}
