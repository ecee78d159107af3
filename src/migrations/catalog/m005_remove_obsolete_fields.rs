//! Fields dropped from the v2 study and user models.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::AppError;
use crate::migrations::{MigrationStep, StepContext, StepSummary};
use crate::models::collections::{STUDY, USER};
use crate::store::{Filter, Update};

const OBSOLETE_STUDY_FIELDS: [&str; 3] = ["experiments", "lastModified", "cipher"];
const OBSOLETE_USER_FIELDS: [&str; 1] = ["tools"];

pub struct M005RemoveObsoleteFields;

impl MigrationStep for M005RemoveObsoleteFields {
    fn id(&self) -> &'static str {
        "m005_remove_obsolete_fields"
    }
    fn description(&self) -> &'static str {
        "Remove experiments, lastModified and cipher from studies and tools from users"
    }

    fn up<'a>(&'a self, ctx: &'a StepContext<'a>) -> BoxFuture<'a, Result<StepSummary, AppError>> {
        async move {
            let studies = ctx
                .store
                .update_many(STUDY, Filter::All, Update::unset(OBSOLETE_STUDY_FIELDS))
                .await?;
            let users = ctx
                .store
                .update_many(USER, Filter::All, Update::unset(OBSOLETE_USER_FIELDS))
                .await?;

            tracing::info!(
                "Removed obsolete fields from {} study(ies) and {} user(s)",
                studies.modified,
                users.modified
            );
            Ok(StepSummary::new()
                .with("studies", studies.modified)
                .with("users", users.modified))
        }
        .boxed()
    }
}
