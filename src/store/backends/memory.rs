//! In-process document store.
//!
//! Evaluates filters and updates with the same semantics the MongoDB
//! backend asks of the server. Used by the test suites.
//!
//! # Example
//!
//! ```ignore
//! use catalog_migrate::store::backends::memory::MemoryStore;
//!
//! let store = MemoryStore::new();
//! store.seed("file", [json!({"tags": null})]).await?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::error::AppError;
use crate::store::document::{
    document_id, Document, DocumentStream, Filter, Projection, Update, UpdateOne, UpdateOutcome,
    ID_FIELD,
};
use crate::store::traits::DocumentStore;

/// A document store held in memory.
///
/// Cheap to clone; clones share the same collections. Collections keep
/// insertion order.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<BTreeMap<String, Vec<Document>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts JSON objects into a collection.
    pub async fn seed<I>(&self, collection: &str, documents: I) -> Result<(), AppError>
    where
        I: IntoIterator<Item = JsonValue>,
    {
        for value in documents {
            match value {
                JsonValue::Object(document) => self.insert_one(collection, document).await?,
                other => {
                    return Err(AppError::Internal(format!(
                        "cannot seed '{}' with non-object value {}",
                        collection, other
                    )))
                }
            }
        }
        Ok(())
    }

    /// Returns a copy of every document in a collection.
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn apply(collection: &str, update: &Update, doc: &mut Document) -> Result<bool, AppError> {
        let id = document_id(doc);
        update
            .apply(doc)
            .map_err(|reason| AppError::malformed(collection, id, reason))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(
        &self,
        collection: &str,
        filter: Filter,
        projection: Option<Projection>,
    ) -> Result<DocumentStream<'_>, AppError> {
        // Snapshot so callers may write to the collection while streaming.
        let matching: Vec<Result<Document, AppError>> = self
            .collections
            .read()
            .await
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter.matches(doc))
                    .map(|doc| match &projection {
                        Some(projection) => Ok(projection.apply(doc)),
                        None => Ok(doc.clone()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Box::pin(futures::stream::iter(matching)))
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Filter,
    ) -> Result<Option<Document>, AppError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| filter.matches(doc)).cloned()))
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Filter,
        update: Update,
    ) -> Result<UpdateOutcome, AppError> {
        let mut collections = self.collections.write().await;
        let mut outcome = UpdateOutcome::default();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(outcome);
        };

        for doc in docs.iter_mut().filter(|doc| filter.matches(doc)) {
            outcome.matched += 1;
            if Self::apply(collection, &update, doc)? {
                outcome.modified += 1;
            }
        }
        Ok(outcome)
    }

    async fn insert_one(&self, collection: &str, mut document: Document) -> Result<(), AppError> {
        if !document.contains_key(ID_FIELD) {
            document.insert(ID_FIELD.to_string(), JsonValue::String(Ulid::new().to_string()));
        }

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if let Some(id) = document.get(ID_FIELD) {
            if docs.iter().any(|doc| doc.get(ID_FIELD) == Some(id)) {
                return Err(AppError::malformed(
                    collection,
                    document_id(&document),
                    "duplicate _id",
                ));
            }
        }
        docs.push(document);
        Ok(())
    }

    async fn drop_collection(&self, collection: &str) -> Result<(), AppError> {
        self.collections.write().await.remove(collection);
        Ok(())
    }

    async fn bulk_update(
        &self,
        collection: &str,
        operations: Vec<UpdateOne>,
    ) -> Result<UpdateOutcome, AppError> {
        let mut collections = self.collections.write().await;
        let mut outcome = UpdateOutcome::default();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(outcome);
        };

        for operation in &operations {
            if let Some(doc) = docs.iter_mut().find(|doc| operation.filter.matches(doc)) {
                outcome.matched += 1;
                if Self::apply(collection, &operation.update, doc)? {
                    outcome.modified += 1;
                }
            }
        }
        Ok(outcome)
    }

    async fn collection_names(&self) -> Result<Vec<String>, AppError> {
        Ok(self.collections.read().await.keys().cloned().collect())
    }
}
