//! Sample ownership backfill (#1346).
//!
//! Samples gain a denormalized reference to the individual that lists them.

use futures::future::BoxFuture;
use futures::{FutureExt, TryStreamExt};

use crate::error::AppError;
use crate::migrations::{MigrationStep, StepContext, StepSummary};
use crate::models::collections::{INDIVIDUAL, SAMPLE};
use crate::models::{from_document, IndividualSamples, SampleOwnership};
use crate::store::{Filter, FindExt, Update};

pub struct M001SampleIndividual;

impl M001SampleIndividual {
    async fn backfill(&self, ctx: &StepContext<'_>) -> Result<StepSummary, AppError> {
        // Every sample starts as owned by nobody
        let reset = ctx
            .store
            .update_many(
                SAMPLE,
                Filter::All,
                Update::Set(SampleOwnership::none().fields()),
            )
            .await?;
        tracing::info!("Reset individual reference on {} sample(s)", reset.matched);

        let mut individuals = ctx
            .store
            .find_in(INDIVIDUAL)
            .filter(Filter::non_empty_array("samples"))
            .project(["samples", "uid", "id"])
            .execute()
            .await?;

        let mut scanned = 0;
        let mut references = 0;
        let mut skipped = 0;
        let mut linked = 0;
        while let Some(doc) = individuals.try_next().await? {
            scanned += 1;
            let individual: IndividualSamples = from_document(INDIVIDUAL, &doc)?;
            let ownership = Update::Set(individual.ownership().fields());

            for sample in individual.samples() {
                // A reference without uid or version would match unrelated samples
                let Some(sample) = sample else {
                    skipped += 1;
                    tracing::debug!(
                        "Individual {} has a sample reference without uid or version",
                        individual.id
                    );
                    continue;
                };
                let outcome = ctx
                    .store
                    .update_many(SAMPLE, sample.filter(), ownership.clone())
                    .await?;
                references += 1;
                linked += outcome.matched;
                if outcome.matched == 0 {
                    tracing::debug!(
                        "Individual {} references missing sample uid={} version={}",
                        individual.id,
                        sample.uid,
                        sample.version
                    );
                }
            }
        }

        tracing::info!(
            "Linked {} sample(s) through {} reference(s) from {} individual(s)",
            linked,
            references,
            scanned
        );
        Ok(StepSummary::new()
            .with("samples_reset", reset.matched)
            .with("individuals", scanned)
            .with("references", references)
            .with("references_skipped", skipped)
            .with("samples_linked", linked))
    }
}

impl MigrationStep for M001SampleIndividual {
    fn id(&self) -> &'static str {
        "m001_sample_individual"
    }
    fn description(&self) -> &'static str {
        "Backfill owning individual uid and id on samples"
    }
    fn ticket(&self) -> Option<&'static str> {
        Some("#1346")
    }

    fn up<'a>(&'a self, ctx: &'a StepContext<'a>) -> BoxFuture<'a, Result<StepSummary, AppError>> {
        async move { self.backfill(ctx).await }.boxed()
    }
}
