//! Core trait for document store access.

use async_trait::async_trait;

use crate::error::AppError;
use crate::store::document::{
    Document, DocumentStream, Filter, Projection, Update, UpdateOne, UpdateOutcome,
};

/// Collection-level operations against a document database.
///
/// Every operation names its collection; there is no implicit "current"
/// collection. Implementations must be cheap to share by reference since
/// migration steps receive `&dyn DocumentStore`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Streams the documents matching `filter`.
    ///
    /// With a projection, only the listed top-level fields and `_id` are
    /// returned.
    async fn find(
        &self,
        collection: &str,
        filter: Filter,
        projection: Option<Projection>,
    ) -> Result<DocumentStream<'_>, AppError>;

    /// Returns the first document matching `filter`, if any.
    async fn find_one(&self, collection: &str, filter: Filter)
        -> Result<Option<Document>, AppError>;

    /// Applies `update` to every document matching `filter`.
    async fn update_many(
        &self,
        collection: &str,
        filter: Filter,
        update: Update,
    ) -> Result<UpdateOutcome, AppError>;

    /// Inserts a document. An `_id` is assigned when the document has none.
    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), AppError>;

    /// Drops the collection and its documents. Dropping a missing
    /// collection succeeds.
    async fn drop_collection(&self, collection: &str) -> Result<(), AppError>;

    /// Applies a batch of single-document updates in one request, in order.
    async fn bulk_update(
        &self,
        collection: &str,
        operations: Vec<UpdateOne>,
    ) -> Result<UpdateOutcome, AppError>;

    /// Lists the collections of the database.
    async fn collection_names(&self) -> Result<Vec<String>, AppError>;
}
