//! `drivelog` - CLI for the drive logger
//!
//! This binary wires the library's ports to the terminal, a local `SQLite`
//! database and the configured export and draft directories.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use drivelog::cli::{
    Cli, Command, ConfigCommand, DeleteCommand, EmailCommand, ExportCommand, ListCommand,
    StatsCommand, TripCommand,
};
use drivelog::delivery::{CommandDelivery, DirectoryDelivery, DraftMailComposer, FallbackDelivery};
use drivelog::ports::{ConfirmGate, DeliveryRoute, FileDelivery};
use drivelog::terminal::{
    AssumeYes, Prompter, TerminalConfirm, TerminalDisplay, TerminalNotifier, TripOutcome,
};
use drivelog::timer::SystemClock;
use drivelog::view::StatsView;
use drivelog::{
    init_logging, App, Config, EmailRequest, ExportFormat, Ports, SqliteBlobStore, TripId,
};

type DriveLog = App<SqliteBlobStore>;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Trip(cmd) => handle_trip(&config, &cmd),
        Command::List(cmd) => handle_list(&open_app(&config)?, &cmd),
        Command::Stats(cmd) => handle_stats(&open_app(&config)?, &cmd),
        Command::Delete(cmd) => handle_delete(&mut open_app(&config)?, &cmd),
        Command::Export(cmd) => handle_export(&config, &open_app(&config)?, &cmd),
        Command::Email(cmd) => handle_email(&config, &open_app(&config)?, cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_app(config: &Config) -> Result<DriveLog> {
    let path = config.database_path();
    let backend = SqliteBlobStore::open(&path)
        .with_context(|| format!("opening drive log at {}", path.display()))?;

    let ports = Ports {
        clock: Arc::new(SystemClock),
        display: Arc::new(TerminalDisplay),
        notifier: Box::new(TerminalNotifier),
        delivery: build_delivery(config)?,
        mail: Box::new(DraftMailComposer::new(config.drafts_dir())),
    };
    Ok(App::open(backend, config.app_settings(), ports))
}

fn build_delivery(config: &Config) -> Result<Box<dyn FileDelivery>> {
    let download = Box::new(DirectoryDelivery::new(config.export_dir()));
    let chain = match &config.export.share_command {
        Some(argv) => {
            let share = CommandDelivery::from_argv(argv, config.export_dir())?;
            FallbackDelivery::new(Box::new(share), download)
        }
        None => FallbackDelivery::download_only(download),
    };
    Ok(Box::new(chain))
}

fn handle_trip(config: &Config, cmd: &TripCommand) -> Result<ExitCode> {
    // Timer ticks run on this runtime while the main thread reads stdin.
    let runtime = tokio::runtime::Runtime::new().context("starting timer runtime")?;
    let _guard = runtime.enter();

    let mut app = open_app(config)?;
    let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());

    Ok(match prompter.run_trip(&mut app, cmd.manual)? {
        TripOutcome::Saved(_) => ExitCode::SUCCESS,
        TripOutcome::Discarded => ExitCode::FAILURE,
    })
}

fn handle_list(app: &DriveLog, cmd: &ListCommand) -> Result<ExitCode> {
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(app.records())?);
        return Ok(ExitCode::SUCCESS);
    }

    let view = app.view();
    if let Some(message) = view.empty_message {
        println!("{message}");
        return Ok(ExitCode::SUCCESS);
    }

    for entry in &view.entries {
        println!("{}  {}", entry.date, entry.title);
        println!(
            "  {} | {} | {}",
            entry.distance, entry.duration, entry.avg_speed
        );
        println!(
            "  {} | {} | {}",
            entry.road_type, entry.day_night, entry.location
        );
        if let Some(vin) = &entry.vin {
            println!("  VIN: {vin}");
        }
        if let Some(license) = &entry.driver_license {
            println!("  License: {license}");
        }
        println!("  id: {}", entry.id);
        println!();
    }
    print_stats(&view.stats);
    Ok(ExitCode::SUCCESS)
}

fn handle_stats(app: &DriveLog, cmd: &StatsCommand) -> Result<ExitCode> {
    let stats = app.stats();
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&StatsView::from(&stats));
    }
    Ok(ExitCode::SUCCESS)
}

fn print_stats(stats: &StatsView) {
    println!("Total Distance:  {}", stats.total_distance);
    println!("Total Duration:  {}", stats.total_duration);
    println!("Average Speed:   {}", stats.avg_speed);
    println!("Total Trips:     {}", stats.trip_count);
}

fn handle_delete(app: &mut DriveLog, cmd: &DeleteCommand) -> Result<ExitCode> {
    let id: TripId = cmd
        .id
        .parse()
        .with_context(|| format!("invalid log entry id: {}", cmd.id))?;

    if app.store().get(id).is_none() {
        eprintln!("No log entry with id {id}");
        return Ok(ExitCode::FAILURE);
    }

    let gate: &dyn ConfirmGate = if cmd.yes { &AssumeYes } else { &TerminalConfirm };
    Ok(if app.delete(id, gate) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn handle_export(config: &Config, app: &DriveLog, cmd: &ExportCommand) -> Result<ExitCode> {
    let format = ExportFormat::from(cmd.format);

    if cmd.stdout {
        return match format.encode(app.records()) {
            Ok(text) => {
                println!("{text}");
                Ok(ExitCode::SUCCESS)
            }
            Err(e) if e.is_empty_collection() => {
                eprintln!("No logs to export");
                Ok(ExitCode::FAILURE)
            }
            Err(e) => Err(e.into()),
        };
    }

    match app.export(format) {
        Ok(DeliveryRoute::Downloaded) => {
            println!("{}", config.export_dir().join(format.filename()).display());
            Ok(ExitCode::SUCCESS)
        }
        Ok(DeliveryRoute::Shared) => Ok(ExitCode::SUCCESS),
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

fn handle_email(config: &Config, app: &DriveLog, cmd: EmailCommand) -> Result<ExitCode> {
    let request = EmailRequest {
        recipient: cmd.to,
        subject: cmd.subject,
        message: cmd.message,
    };
    match app.email(&request) {
        Ok(()) => {
            println!("Draft saved in {}", config.drafts_dir().display());
            Ok(ExitCode::SUCCESS)
        }
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Storage key:        {}", config.storage.storage_key);
                println!();
                println!("[Timer]");
                println!("  Tick interval (ms): {}", config.timer.tick_interval_ms);
                println!();
                println!("[Export]");
                println!("  Directory:          {}", config.export_dir().display());
                match &config.export.share_command {
                    Some(argv) => println!("  Share command:      {}", argv.join(" ")),
                    None => println!("  Share command:      (none)"),
                }
                println!();
                println!("[Email]");
                println!("  Default subject:    {}", config.email.default_subject);
                println!("  Drafts directory:   {}", config.drafts_dir().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => {
                    println!("Configuration error: {e}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
