use crate::report::{
    run_confirm, run_leaderboard, run_reset, ConfirmArgs, LeaderboardArgs, ResetArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use division_pool::config::{PoolConfig, StorageBackend};
use division_pool::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "division-pool",
    about = "Run the division pool service or inspect the pool from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the best and worst predictors
    Leaderboard(LeaderboardArgs),
    /// Assign a subject to a division and print the updated leaderboard
    Confirm(ConfirmArgs),
    /// Clear all stored data and reload the roster and predictions
    Reset(ResetArgs),
}

/// Storage overrides shared by every command.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct StorageArgs {
    /// Storage backend: memory, json or sqlite
    #[arg(long, value_parser = parse_storage)]
    pub(crate) storage: Option<StorageBackend>,
    /// Directory holding the JSON store or SQLite file
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

impl StorageArgs {
    pub(crate) fn apply(self, pool: &mut PoolConfig) {
        if let Some(storage) = self.storage {
            pool.storage = storage;
        }
        if let Some(data_dir) = self.data_dir {
            pool.data_dir = data_dir;
        }
    }
}

fn parse_storage(value: &str) -> Result<StorageBackend, String> {
    StorageBackend::parse(value).map_err(|err| err.to_string())
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) storage: StorageArgs,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Leaderboard(args) => run_leaderboard(args),
        Command::Confirm(args) => run_confirm(args),
        Command::Reset(args) => run_reset(args),
    }
}
