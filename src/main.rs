//! RouterOS backup CLI - change-detection-gated configuration backups over SSH.
//!
//! Provides both human-friendly and agent-friendly (robot mode) interfaces.
#![forbid(unsafe_code)]

use std::io::{self, IsTerminal};

use clap::Parser;
use colored::Colorize;
use serde::Serialize;

use rosbackup::batch::{self, DeviceStatus, RunMode, RunReport};
use rosbackup::cli::{Cli, Commands};
use rosbackup::config::{self, DeviceEntry, DeviceListError, RunContext};
use rosbackup::error::{BackupError, Result};
use rosbackup::{logging, session};

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

fn main() {
    let cli = Cli::parse();

    // Handle no-color flag or non-TTY
    if cli.no_color || !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    logging::init_logging(cli.use_json(), cli.verbose, cli.quiet);

    // Run the command
    let result = run(&cli);

    // Handle errors
    if let Err(e) = result {
        output_error(&cli, &e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        None => cmd_backup(cli),
        Some(Commands::Exec(args)) => cmd_exec(cli, args),
        Some(Commands::Version) => cmd_version(cli),
        Some(Commands::Completions(args)) => cmd_completions(cli, args),
    }
}

// === Command Implementations ===

/// Default mode: the full backup workflow over every listed device.
///
/// Individual device failures are already recorded in the report; the
/// process exits zero as long as the run itself could start.
fn cmd_backup(cli: &Cli) -> Result<()> {
    let (ctx, entries) = load_run(cli)?;

    let report = batch::run_backups(&entries, &ctx, |entry| session::connect_boxed(entry, &ctx));

    print_report(cli, &report);
    Ok(())
}

/// Broadcast mode: one command on every device, outputs collected.
fn cmd_exec(cli: &Cli, args: &rosbackup::cli::ExecArgs) -> Result<()> {
    let (ctx, entries) = load_run(cli)?;

    let report = batch::run_broadcast(&entries, &args.command, |entry| {
        session::connect_boxed(entry, &ctx)
    });

    print_report(cli, &report);
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_version(cli: &Cli) -> Result<()> {
    if cli.use_json() {
        output_json(cli, &serde_json::json!({ "version": build_info::VERSION }));
    } else {
        println!("rosbackup {}", build_info::VERSION);
    }
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_completions(_cli: &Cli, args: &rosbackup::cli::CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    clap_complete::generate(args.shell, &mut Cli::command(), "rosbackup", &mut io::stdout());
    Ok(())
}

// === Run Setup ===

/// Resolve the run context and device list, mapping failures to the
/// fatal startup errors that exit the process before any device contact.
fn load_run(cli: &Cli) -> Result<(RunContext, Vec<DeviceEntry>)> {
    let ctx = RunContext::resolve(
        cli.root.as_deref(),
        cli.settle_secs,
        cli.connect_timeout_secs,
    )?;

    let entries = config::load_device_list(&cli.devices).map_err(|e| match e {
        DeviceListError::OpenError(path, _) => BackupError::DeviceListNotFound { path },
        other => BackupError::DeviceListParse(other.to_string()),
    })?;

    Ok((ctx, entries))
}

// === Output ===

fn print_report(cli: &Cli, report: &RunReport) {
    if cli.use_json() {
        output_json(cli, report);
        return;
    }

    // Broadcast mode shows each device's captured output first.
    if report.mode == RunMode::Exec && !cli.quiet {
        for result in &report.results {
            if let Some(output) = &result.output {
                println!("{}", format!("--- {} ---", result.address).bold());
                print!("{output}");
                if !output.ends_with('\n') {
                    println!();
                }
            }
        }
        println!();
    }

    for result in &report.results {
        let status = match result.status {
            DeviceStatus::Ok => "OK".green(),
            DeviceStatus::Error => "ERROR".red(),
        };
        println!("{} = {}", result.address, status);
    }

    if !cli.quiet {
        println!();
        println!(
            "{} devices: {} ok, {} failed",
            report.results.len(),
            report.ok_count,
            report.error_count
        );
        #[allow(clippy::cast_precision_loss)] // Display only
        let secs = report.elapsed_ms as f64 / 1000.0;
        println!("Total time spent: {secs:.1}s");
    }
}

fn output_json<T: Serialize>(cli: &Cli, data: &T) {
    let json = if cli.use_compact_json() {
        serde_json::to_string(data).unwrap()
    } else {
        serde_json::to_string_pretty(data).unwrap()
    };
    println!("{json}");
}

fn output_error(cli: &Cli, error: &BackupError) {
    if cli.use_json() {
        let json = serde_json::json!({
            "error": true,
            "message": error.to_string(),
            "suggestion": error.suggestion(),
            "recoverable": error.is_user_recoverable(),
        });
        eprintln!("{}", serde_json::to_string_pretty(&json).unwrap());
    } else {
        eprintln!("{}: {}", "Error".red().bold(), error);
        if let Some(suggestion) = error.suggestion() {
            eprintln!("{}: {}", "Hint".yellow(), suggestion);
        }
    }
}
