use clap::{ArgAction, Parser, Subcommand};
use commands::{config, format_id, sync};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "playsync")]
#[command(about = "PlaySync - Carry Kodi watch history over to Jellyfin")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Config file (defaults to the platform config dir; environment variables take precedence)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Also write logs to this file (rotated daily)
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy watched state from the Kodi database into the Jellyfin library (one pass)
    #[command(long_about = "Read every Kodi file with a play count above zero, find the Jellyfin item whose path contains the Kodi path, and insert or update that item's user data (played, play count, last played date). Unmatched files are skipped.")]
    Sync {
        /// Match and decide insert/update, but do not write to Jellyfin
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,

        /// Print a per-file outcome table
        #[arg(long, action = ArgAction::SetTrue)]
        details: bool,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Format a raw 16-byte item id (32 hex digits) as a canonical GUID string
    FormatId {
        /// Hex-encoded bytes, e.g. as copied from a BLOB column
        hex: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration (masks the database password)
    Show {
        /// Show the password in clear text
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init_logging_with_file(cli.verbose, cli.quiet, cli.log_file.clone())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Sync { dry_run, details } => sync::run_sync(cli.config.as_deref(), dry_run, details, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, cli.config.as_deref(), &output),
        Commands::FormatId { hex } => format_id::run_format_id(&hex, &output),
    }
}
