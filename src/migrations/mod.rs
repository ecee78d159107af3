//! Catalog schema migrations.
//!
//! A migration is an ordered list of steps ([`MigrationStep`]) collected
//! in a [`Register`]. Steps are:
//! - **Explicit**: each receives the store handle through [`StepContext`]
//! - **Sequential**: run one after another, in registration order
//! - **Non-transactional**: a failure leaves earlier steps applied
//! - **Re-runnable**: every step can run again on an upgraded catalog
//!
//! No version is recorded in the database; the operator decides when to
//! run the upgrade and which steps to repeat after a partial failure.

pub mod bulk;
pub mod catalog;
mod runner;
mod traits;

pub use bulk::{migrate_collection, BulkSummary};
pub use runner::{run_migrations, MigrationReport, RunOptions, StepReport};
pub use traits::{MigrationStep, Register, StepContext, StepSummary};
