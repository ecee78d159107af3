//! Run command handler.

use clap::Args;
use color_eyre::eyre::eyre;
use color_eyre::Result;

use crate::config::{Config, Overrides};
use crate::migrations::{run_migrations, RunOptions};
use crate::store::backends::mongo::MongoStore;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// MongoDB connection string (overrides config)
    #[arg(long)]
    pub uri: Option<String>,

    /// Catalog database name (overrides config)
    #[arg(long)]
    pub database: Option<String>,

    /// Run only this step; repeat to select several. Defaults to all steps.
    #[arg(long = "step", value_name = "ID")]
    pub step: Vec<String>,

    /// Updates sent per bulk request (overrides config)
    #[arg(long)]
    pub batch_size: Option<usize>,
}

impl RunArgs {
    /// Connect to the catalog and apply the selected steps.
    pub async fn run(self) -> Result<()> {
        let config = Config::load_with(&Overrides {
            uri: self.uri,
            database: self.database,
            batch_size: self.batch_size,
        })?;

        tracing::info!(
            "Connecting to MongoDB database '{}'",
            config.mongodb.database
        );
        let store = MongoStore::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| eyre!("Failed to connect: {}", e))?;
        tracing::info!("Connected to MongoDB");

        let options = RunOptions {
            steps: self.step,
            batch_size: config.migration.batch_size,
        };
        let report = run_migrations(&store, &options)
            .await
            .map_err(|e| eyre!("Migration failed: {}", e))?;

        tracing::info!(
            "Catalog upgraded to v{}, applied: {:?}",
            report.target_version,
            report.applied_ids()
        );
        Ok(())
    }
}
