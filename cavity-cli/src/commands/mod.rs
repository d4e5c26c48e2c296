//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod simulation;

pub use simulation::SubmitArgs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a new simulation
    Submit(SubmitArgs),
    /// List all simulations, most recent first
    List,
    /// Show one simulation
    Get {
        /// Simulation ID
        id: i64,
    },
    /// Follow a simulation until it completes or fails
    Watch {
        /// Simulation ID
        id: i64,

        /// Seconds between status checks
        #[arg(long, default_value_t = 2)]
        interval: u64,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        Commands::Submit(args) => simulation::submit(&client, args).await,
        Commands::List => simulation::list(&client).await,
        Commands::Get { id } => simulation::get(&client, id).await,
        Commands::Watch { id, interval } => simulation::watch(&client, id, interval).await,
    }
}
