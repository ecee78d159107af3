//! The dataset collection is retired.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::AppError;
use crate::migrations::{MigrationStep, StepContext, StepSummary};
use crate::models::collections::DATASET;

pub struct M003DropDataset;

impl MigrationStep for M003DropDataset {
    fn id(&self) -> &'static str {
        "m003_drop_dataset"
    }
    fn description(&self) -> &'static str {
        "Drop the deprecated dataset collection"
    }

    fn up<'a>(&'a self, ctx: &'a StepContext<'a>) -> BoxFuture<'a, Result<StepSummary, AppError>> {
        async move {
            let existed = ctx
                .store
                .collection_names()
                .await?
                .iter()
                .any(|name| name == DATASET);

            ctx.store.drop_collection(DATASET).await?;
            if existed {
                tracing::warn!("Dropped collection '{}'", DATASET);
            } else {
                tracing::info!("Collection '{}' already absent", DATASET);
            }
            Ok(StepSummary::new().with("dropped", existed as u64))
        }
        .boxed()
    }
}
