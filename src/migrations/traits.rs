//! Migration step trait and registry.

use std::fmt;

use futures::future::BoxFuture;

use crate::error::AppError;
use crate::store::DocumentStore;

// =============================================================================
// Step Context
// =============================================================================

/// What every step receives: the store handle and bulk tuning.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    pub store: &'a dyn DocumentStore,
    /// Staged updates per bulk request. Zero is treated as one.
    pub batch_size: usize,
}

impl<'a> StepContext<'a> {
    pub fn new(store: &'a dyn DocumentStore, batch_size: usize) -> Self {
        Self { store, batch_size }
    }
}

// =============================================================================
// Step Summary
// =============================================================================

/// Named counters reported by a step, e.g. `samples_reset=12`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepSummary {
    counters: Vec<(&'static str, u64)>,
}

impl StepSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, value: u64) -> Self {
        self.counters.push((name, value));
        self
    }

    /// Returns a counter by name.
    pub fn get(&self, name: &str) -> Option<u64> {
        self.counters
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }
}

impl fmt::Display for StepSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.counters.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

// =============================================================================
// Migration Step Trait
// =============================================================================

/// One ticketed unit of a schema upgrade.
/// Uses BoxFuture to avoid `'static` requirements from `#[async_trait]`.
pub trait MigrationStep: Send + Sync {
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;

    /// Issue tracker reference, when the step addresses one.
    fn ticket(&self) -> Option<&'static str> {
        None
    }

    fn up<'a>(&'a self, ctx: &'a StepContext<'a>) -> BoxFuture<'a, Result<StepSummary, AppError>>;
}

// =============================================================================
// Step Registry
// =============================================================================

/// Ordered set of steps making up one upgrade.
pub struct Register {
    target_version: &'static str,
    steps: Vec<Box<dyn MigrationStep>>,
}

impl Register {
    pub fn new(target_version: &'static str) -> Self {
        Self {
            target_version,
            steps: Vec::new(),
        }
    }

    pub fn register(mut self, step: impl MigrationStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Schema version the steps upgrade to.
    pub fn target_version(&self) -> &'static str {
        self.target_version
    }

    /// Iterate over steps in run order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn MigrationStep> {
        self.steps.iter().map(|s| s.as_ref())
    }

    /// Resolves a selection of step ids, in run order.
    ///
    /// An empty selection means every step. Fails on the first unknown id,
    /// before anything runs.
    pub fn select(&self, ids: &[String]) -> Result<Vec<&dyn MigrationStep>, AppError> {
        if let Some(unknown) = ids
            .iter()
            .find(|id| !self.steps.iter().any(|s| s.id() == id.as_str()))
        {
            return Err(AppError::UnknownStep(unknown.clone()));
        }

        Ok(self
            .iter()
            .filter(|step| ids.is_empty() || ids.iter().any(|id| id == step.id()))
            .collect())
    }
}
