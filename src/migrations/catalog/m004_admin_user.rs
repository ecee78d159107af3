//! Built-in administrator user (#1425).
//!
//! The administrator credentials move from the metadata singleton into a
//! regular user document. The existence check and the insert are separate
//! operations, so two concurrent runs could both insert; the upgrade is
//! expected to run once, by one operator.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::AppError;
use crate::migrations::{MigrationStep, StepContext, StepSummary};
use crate::models::collections::{METADATA, USER};
use crate::models::{AdminCredentials, AdminUser, ADMIN_USER_ID};
use crate::store::{Filter, Update, ID_FIELD};

pub struct M004AdminUser;

impl M004AdminUser {
    async fn bootstrap(&self, ctx: &StepContext<'_>) -> Result<StepSummary, AppError> {
        let existing = ctx
            .store
            .find_one(USER, Filter::eq("id", ADMIN_USER_ID))
            .await?;
        if existing.is_some() {
            tracing::info!("User '{}' already exists, skipping", ADMIN_USER_ID);
            return Ok(StepSummary::new().with("inserted", 0));
        }

        let metadata = ctx
            .store
            .find_one(METADATA, Filter::All)
            .await?
            .ok_or_else(|| AppError::missing_field(METADATA, "admin"))?;
        let credentials = AdminCredentials::from_metadata(&metadata)?;

        let user = AdminUser::new(credentials);
        ctx.store.insert_one(USER, user.to_document()?).await?;
        tracing::info!("Created administrator user '{}'", ADMIN_USER_ID);

        // The credentials must only be readable from the user from now on
        let target = metadata
            .get(ID_FIELD)
            .cloned()
            .map(Filter::by_id)
            .unwrap_or(Filter::All);
        ctx.store
            .update_many(
                METADATA,
                target,
                Update::unset(AdminCredentials::DONATED_FIELDS),
            )
            .await?;
        tracing::info!("Removed administrator credentials from metadata");

        Ok(StepSummary::new().with("inserted", 1))
    }
}

impl MigrationStep for M004AdminUser {
    fn id(&self) -> &'static str {
        "m004_admin_user"
    }
    fn description(&self) -> &'static str {
        "Create the opencga administrator user from metadata credentials"
    }
    fn ticket(&self) -> Option<&'static str> {
        Some("#1425")
    }

    fn up<'a>(&'a self, ctx: &'a StepContext<'a>) -> BoxFuture<'a, Result<StepSummary, AppError>> {
        async move { self.bootstrap(ctx).await }.boxed()
    }
}
