//! CLI module for catalog-migrate.
//!
//! Subcommands:
//! - `run`: Upgrade a catalog database
//! - `list`: Show the upgrade steps in run order

mod list;
mod run;

use clap::{Parser, Subcommand};

pub use run::RunArgs;

/// catalog-migrate - Catalog schema upgrade
#[derive(Parser)]
#[command(name = "catalog-migrate")]
#[command(about = "Upgrade a catalog database to schema v2.0.0")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply the upgrade steps to a catalog database
    Run(RunArgs),

    /// List the upgrade steps in run order
    List,
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Run(args) => args.run().await,
            Command::List => list::run_list(),
        }
    }
}
