//! Null file tags become an empty list.

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::json;

use crate::error::AppError;
use crate::migrations::{MigrationStep, StepContext, StepSummary};
use crate::models::collections::FILE;
use crate::store::{Filter, Update};

pub struct M002FileTags;

impl MigrationStep for M002FileTags {
    fn id(&self) -> &'static str {
        "m002_file_tags"
    }
    fn description(&self) -> &'static str {
        "Replace null file tags with an empty list"
    }

    fn up<'a>(&'a self, ctx: &'a StepContext<'a>) -> BoxFuture<'a, Result<StepSummary, AppError>> {
        async move {
            // Files without a tags field keep it absent
            let outcome = ctx
                .store
                .update_many(FILE, Filter::is_null("tags"), Update::set("tags", json!([])))
                .await?;
            tracing::info!("Normalized tags on {} file(s)", outcome.modified);
            Ok(StepSummary::new().with("files", outcome.modified))
        }
        .boxed()
    }
}
