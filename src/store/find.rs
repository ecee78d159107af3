//! Fluent builder for find operations.

use futures::{StreamExt, TryStreamExt};

use crate::error::AppError;
use crate::store::document::{Document, DocumentStream, Filter, Projection};
use crate::store::traits::DocumentStore;

/// A builder for constructing and executing a find.
///
/// # Example
///
/// ```ignore
/// let individuals = store
///     .find_in("individual")
///     .filter(Filter::non_empty_array("samples"))
///     .project(["samples", "uid", "id"])
///     .fetch_all()
///     .await?;
/// ```
pub struct Find<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    collection: String,
    filter: Filter,
    projection: Option<Projection>,
}

impl<'a, S: DocumentStore + ?Sized> Find<'a, S> {
    /// Creates a find over every document of `collection`.
    pub fn new(store: &'a S, collection: &str) -> Self {
        Self {
            store,
            collection: collection.to_string(),
            filter: Filter::All,
            projection: None,
        }
    }

    /// Narrows the find with another filter (combined with AND).
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = self.filter.and(filter);
        self
    }

    /// Restricts the returned fields. `_id` is always returned.
    pub fn project<I, T>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.projection = Some(Projection::fields(fields));
        self
    }

    /// Executes the find and returns a stream of documents.
    pub async fn execute(self) -> Result<DocumentStream<'a>, AppError> {
        self.store
            .find(&self.collection, self.filter, self.projection)
            .await
    }

    /// Executes the find and collects every document.
    ///
    /// For large collections use [`execute`](Find::execute) and stream.
    pub async fn fetch_all(self) -> Result<Vec<Document>, AppError> {
        self.execute().await?.try_collect().await
    }

    /// Executes the find and returns the first document, if any.
    pub async fn fetch_one(self) -> Result<Option<Document>, AppError> {
        let mut stream = self.execute().await?;
        stream.next().await.transpose()
    }

    /// Counts the matching documents.
    pub async fn count(self) -> Result<u64, AppError> {
        self.execute()
            .await?
            .try_fold(0u64, |n, _| async move { Ok(n + 1) })
            .await
    }
}

/// Extension trait providing `store.find_in(collection)`.
pub trait FindExt: DocumentStore {
    fn find_in(&self, collection: &str) -> Find<'_, Self> {
        Find::new(self, collection)
    }
}

impl<S: DocumentStore + ?Sized> FindExt for S {}
