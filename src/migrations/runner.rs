//! Migration runner.

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::migrations::catalog;
use crate::migrations::traits::{Register, StepContext, StepSummary};
use crate::store::DocumentStore;

/// What to run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Step ids to run; empty means all of them.
    pub steps: Vec<String>,
    /// Staged updates per bulk request.
    pub batch_size: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            batch_size: crate::config::DEFAULT_BATCH_SIZE,
        }
    }
}

/// Outcome of one applied step.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub id: String,
    pub description: String,
    pub summary: StepSummary,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Result of running migrations.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub target_version: String,
    pub applied: Vec<StepReport>,
}

impl MigrationReport {
    pub fn applied_ids(&self) -> Vec<&str> {
        self.applied.iter().map(|s| s.id.as_str()).collect()
    }
}

/// Run the catalog upgrade against `store`.
pub async fn run_migrations(
    store: &dyn DocumentStore,
    options: &RunOptions,
) -> Result<MigrationReport, AppError> {
    run_register(&catalog::create_register(), store, options).await
}

/// Run the selected steps of `register` in order.
///
/// Stops at the first failing step and returns its error. Steps already
/// applied are not undone.
pub async fn run_register(
    register: &Register,
    store: &dyn DocumentStore,
    options: &RunOptions,
) -> Result<MigrationReport, AppError> {
    let steps = register.select(&options.steps)?;
    let ctx = StepContext::new(store, options.batch_size);
    let mut applied = Vec::with_capacity(steps.len());

    for step in steps {
        tracing::info!(
            "Applying step {}{}: {}",
            step.id(),
            step.ticket().map(|t| format!(" ({})", t)).unwrap_or_default(),
            step.description()
        );

        let started_at = Utc::now();
        let summary = match step.up(&ctx).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(
                    "Step {} failed after {} applied step(s): {}",
                    step.id(),
                    applied.len(),
                    e
                );
                return Err(e);
            }
        };
        let finished_at = Utc::now();

        tracing::info!("Step {} complete: {}", step.id(), summary);
        applied.push(StepReport {
            id: step.id().to_string(),
            description: step.description().to_string(),
            summary,
            started_at,
            finished_at,
        });
    }

    Ok(MigrationReport {
        target_version: register.target_version().to_string(),
        applied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::MigrationStep;
    use crate::store::backends::memory::MemoryStore;
    use crate::store::{Filter, Update};
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use serde_json::json;

    struct SetMarker(&'static str);

    impl MigrationStep for SetMarker {
        fn id(&self) -> &'static str {
            self.0
        }
        fn description(&self) -> &'static str {
            "sets a marker field"
        }
        fn up<'a>(
            &'a self,
            ctx: &'a StepContext<'a>,
        ) -> BoxFuture<'a, Result<StepSummary, AppError>> {
            async move {
                let outcome = ctx
                    .store
                    .update_many("marker", Filter::All, Update::set(self.0, true))
                    .await?;
                Ok(StepSummary::new().with("modified", outcome.modified))
            }
            .boxed()
        }
    }

    struct Fail;

    impl MigrationStep for Fail {
        fn id(&self) -> &'static str {
            "fail"
        }
        fn description(&self) -> &'static str {
            "always fails"
        }
        fn up<'a>(
            &'a self,
            _ctx: &'a StepContext<'a>,
        ) -> BoxFuture<'a, Result<StepSummary, AppError>> {
            async move { Err(AppError::Internal("boom".to_string())) }.boxed()
        }
    }

    async fn marker_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.seed("marker", [json!({"_id": 1})]).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_failure_keeps_earlier_steps_and_skips_later_ones() {
        let store = marker_store().await;
        let register = Register::new("test")
            .register(SetMarker("a"))
            .register(Fail)
            .register(SetMarker("b"));

        let result = run_register(&register, &store, &RunOptions::default()).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        let marker = store.documents("marker").await[0].clone();
        assert_eq!(marker.get("a"), Some(&json!(true)));
        assert_eq!(marker.get("b"), None);
    }

    #[tokio::test]
    async fn test_unknown_step_runs_nothing() {
        let store = marker_store().await;
        let register = Register::new("test").register(SetMarker("a"));
        let options = RunOptions {
            steps: vec!["a".to_string(), "nope".to_string()],
            ..RunOptions::default()
        };

        let result = run_register(&register, &store, &options).await;

        assert!(matches!(result, Err(AppError::UnknownStep(id)) if id == "nope"));
        assert_eq!(store.documents("marker").await[0].get("a"), None);
    }

    #[tokio::test]
    async fn test_report_lists_applied_steps() {
        let store = marker_store().await;
        let register = Register::new("test")
            .register(SetMarker("a"))
            .register(SetMarker("b"));
        let options = RunOptions {
            steps: vec!["b".to_string()],
            ..RunOptions::default()
        };

        let report = run_register(&register, &store, &options).await.unwrap();

        assert_eq!(report.target_version, "test");
        assert_eq!(report.applied_ids(), vec!["b"]);
        assert_eq!(report.applied[0].summary.get("modified"), Some(1));
        assert!(report.applied[0].finished_at >= report.applied[0].started_at);
    }

    #[test]
    fn test_catalog_register_order() {
        let register = catalog::create_register();
        let ids: Vec<_> = register.iter().map(|s| s.id()).collect();
        assert_eq!(
            ids,
            vec![
                "m001_sample_individual",
                "m002_file_tags",
                "m003_drop_dataset",
                "m004_admin_user",
                "m005_remove_obsolete_fields",
                "m006_variable_type",
            ]
        );
        assert_eq!(register.target_version(), "2.0.0");
    }
}
