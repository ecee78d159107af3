//! Per-document patching applied through batched updates.

use futures::TryStreamExt;

use crate::error::AppError;
use crate::store::{
    document_id, Document, DocumentStore, Filter, Projection, Update, UpdateOne, ID_FIELD,
};

/// Counters from a [`migrate_collection`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkSummary {
    /// Documents read.
    pub scanned: u64,
    /// Updates staged by the patch function.
    pub staged: u64,
    /// Bulk requests sent.
    pub batches: u64,
    pub matched: u64,
    pub modified: u64,
}

/// Streams the documents matching `filter` and patches each one.
///
/// `patch` sees every document (narrowed by `projection`) and returns the
/// update to stage for it, or `None` to leave it alone. Staged updates
/// target the document by `_id` and are sent `batch_size` at a time, plus a
/// final partial batch. Nothing is written for a document whose patch
/// returns `None`.
///
/// The first failing patch or bulk request aborts the pass; batches sent
/// before it stay applied.
pub async fn migrate_collection<F>(
    store: &dyn DocumentStore,
    collection: &str,
    filter: Filter,
    projection: Option<Projection>,
    batch_size: usize,
    mut patch: F,
) -> Result<BulkSummary, AppError>
where
    F: FnMut(&Document) -> Result<Option<Update>, AppError> + Send,
{
    let batch_size = batch_size.max(1);
    let mut summary = BulkSummary::default();
    let mut staged: Vec<UpdateOne> = Vec::with_capacity(batch_size);

    let mut documents = store.find(collection, filter, projection).await?;
    while let Some(document) = documents.try_next().await? {
        summary.scanned += 1;

        let Some(update) = patch(&document)? else {
            continue;
        };
        let id = document
            .get(ID_FIELD)
            .cloned()
            .ok_or_else(|| AppError::malformed(collection, document_id(&document), "no _id"))?;

        staged.push(UpdateOne::new(Filter::by_id(id), update));
        summary.staged += 1;

        if staged.len() >= batch_size {
            flush(store, collection, &mut staged, &mut summary).await?;
        }
    }

    if !staged.is_empty() {
        flush(store, collection, &mut staged, &mut summary).await?;
    }
    Ok(summary)
}

async fn flush(
    store: &dyn DocumentStore,
    collection: &str,
    staged: &mut Vec<UpdateOne>,
    summary: &mut BulkSummary,
) -> Result<(), AppError> {
    let operations = std::mem::take(staged);
    tracing::debug!("Sending {} staged update(s) to '{}'", operations.len(), collection);

    let outcome = store.bulk_update(collection, operations).await?;
    summary.batches += 1;
    summary.matched += outcome.matched;
    summary.modified += outcome.modified;
    Ok(())
}
