mod db;
mod watch;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "dropwatch-cli")]
#[command(about = "Watch a Shopify storefront for new drops, restocks and lock changes")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one watch job: catalog pass, then the lock check.
    Run {
        /// Log messages instead of posting them and skip every store write.
        #[arg(long)]
        dry_run: bool,
    },
    /// Probe the storefront lock state once without persisting it.
    Lock,
    /// Print a summary of the persisted snapshot and lock state.
    Snapshot {
        /// Emit the summary as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Database management for the Postgres backend.
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations.
    Migrate,
    /// Check connectivity.
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = dropwatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Run { dry_run } => watch::run_watch(&config, dry_run).await,
        Commands::Lock => watch::run_lock_probe(&config).await,
        Commands::Snapshot { json } => watch::run_snapshot_summary(&config, json).await,
        Commands::Db { command } => match command {
            DbCommands::Migrate => db::run_migrate(&config).await,
            DbCommands::Ping => db::run_ping(&config).await,
        },
    }
}
