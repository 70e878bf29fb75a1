use clap::{ArgAction, Parser, Subcommand};
use commands::{config, daemon, link, prune, sync};
use shelf_sync_config::PathManager;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "shelfsync")]
#[command(about = "ShelfSync - Mirror your reading shelf and watch list into a Notion database")]
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

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync pass over every enabled source
    #[command(long_about = "Fetch the WeRead shelf and/or Douban lists, create or update one Notion record per item, and append new WeRead highlights to each book's page. Items that fail are reported and retried on the next run.")]
    Sync {
        /// Only sync this source (weread, douban)
        #[arg(long, value_name = "SOURCE")]
        source: Option<String>,
    },
    /// Run as daemon with internal scheduler
    #[command(long_about = "Run ShelfSync in the foreground, syncing on a cron schedule. A run that is still in progress when the next one is due causes that tick to be skipped.")]
    Daemon {
        /// Cron schedule with seconds (e.g., '0 0 */6 * * *' for every 6 hours)
        #[arg(long, value_name = "SCHEDULE")]
        schedule: Option<String>,

        /// Skip initial sync on startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_sync: bool,
    },
    /// Print the WeRead reader link for a book id
    Link {
        /// WeRead book id
        id: String,
    },
    /// Drop multi-select options no record uses any more
    #[command(name = "prune-options")]
    PruneOptions {
        /// Multi-select property to clean up (e.g., Categories)
        #[arg(long, value_name = "PROPERTY")]
        property: String,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks secrets)
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Print the config and credentials file locations
    Path,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // The daemon keeps a rotating log file; one-shot commands log to stderr
    let log_file = match cli.command {
        Commands::Daemon { .. } => Some(PathManager::default().daemon_log_file()),
        _ => None,
    };
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Sync { source } => sync::run_sync(source, &output).await,
        Commands::Daemon {
            schedule,
            no_startup_sync,
        } => daemon::run_daemon(schedule, no_startup_sync, &output).await,
        Commands::Link { id } => link::run_link(&id, &output),
        Commands::PruneOptions { property } => prune::run_prune(&property, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, &output),
    }
}
