//! Variable type `TEXT` becomes `STRING` (#1479).
//!
//! Each study's whole `variableSets` array is rewritten in memory and
//! written back with a single `$set`, which avoids addressing arbitrarily
//! nested array elements by path. Studies without a `TEXT` variable are
//! not written.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::AppError;
use crate::migrations::bulk::migrate_collection;
use crate::migrations::{MigrationStep, StepContext, StepSummary};
use crate::models::collections::STUDY;
use crate::models::{rewrite_variable_types, LEGACY_TEXT_TYPE, STRING_TYPE};
use crate::store::{document_id, Document, Filter, Projection, Update};

const VARIABLE_SETS_FIELD: &str = "variableSets";

pub struct M006VariableType;

/// Returns the `$set` for a study whose variable sets contain `TEXT`.
fn patch_study(doc: &Document) -> Result<Option<Update>, AppError> {
    let Some(raw) = doc.get(VARIABLE_SETS_FIELD) else {
        return Ok(None);
    };

    let mut sets = raw.clone();
    let rewritten = rewrite_variable_types(&mut sets, LEGACY_TEXT_TYPE, STRING_TYPE);
    if rewritten == 0 {
        return Ok(None);
    }

    tracing::debug!(
        "Study {}: {} variable(s) {} -> {}",
        document_id(doc),
        rewritten,
        LEGACY_TEXT_TYPE,
        STRING_TYPE
    );
    Ok(Some(Update::set(VARIABLE_SETS_FIELD, sets)))
}

impl MigrationStep for M006VariableType {
    fn id(&self) -> &'static str {
        "m006_variable_type"
    }
    fn description(&self) -> &'static str {
        "Rename variable type TEXT to STRING in study variable sets"
    }
    fn ticket(&self) -> Option<&'static str> {
        Some("#1479")
    }

    fn up<'a>(&'a self, ctx: &'a StepContext<'a>) -> BoxFuture<'a, Result<StepSummary, AppError>> {
        async move {
            let summary = migrate_collection(
                ctx.store,
                STUDY,
                Filter::non_empty_array(VARIABLE_SETS_FIELD),
                Some(Projection::fields([VARIABLE_SETS_FIELD])),
                ctx.batch_size,
                patch_study,
            )
            .await?;

            tracing::info!(
                "Rewrote variable types in {} of {} study(ies)",
                summary.modified,
                summary.scanned
            );
            Ok(StepSummary::new()
                .with("studies_scanned", summary.scanned)
                .with("studies_updated", summary.modified)
                .with("batches", summary.batches))
        }
        .boxed()
    }
}
