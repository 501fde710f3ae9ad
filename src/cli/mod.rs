//! CLI argument definitions and command dispatch.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// RouterOS backup CLI - change-detection-gated configuration backups over SSH.
///
/// Robot Mode: Use --robot or --format=json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "rosbackup", version, about, long_about = None)]
#[command(propagate_version = true)]
#[allow(clippy::struct_excessive_bools)] // CLI flags naturally use multiple bools
pub struct Cli {
    /// Output format (text for humans, json for agents/scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "ROSBACKUP_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose output (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        action = ArgAction::SetTrue,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub no_color: bool,

    /// Device list file (one 'address;username;password' per line)
    #[arg(
        long,
        short = 'd',
        global = true,
        default_value = "devices.conf",
        env = "ROSBACKUP_DEVICES"
    )]
    pub devices: PathBuf,

    /// Backup root directory (overrides ROSBACKUP_ROOT)
    #[arg(long, global = true, env = "ROSBACKUP_ROOT")]
    pub root: Option<PathBuf>,

    /// Seconds to wait after issuing an on-device export/backup command
    #[arg(long, global = true, default_value = "5")]
    pub settle_secs: u64,

    /// SSH connection timeout in seconds
    #[arg(long, global = true, default_value = "10")]
    pub connect_timeout_secs: u64,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts and agents
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
///
/// Running with no subcommand performs the full backup workflow over all
/// devices in the list.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute one command on every device instead of backing up
    Exec(ExecArgs),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// === Argument Structs ===

#[derive(Parser, Debug)]
pub struct ExecArgs {
    /// Command to run on each device (e.g., "/system identity print")
    pub command: String,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
