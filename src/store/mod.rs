//! Document store abstraction.
//!
//! The migration steps talk to the catalog through the [`DocumentStore`]
//! trait and never to a driver directly. The trait covers only what the
//! steps need: streaming finds with projections, multi-document updates,
//! single inserts, collection drops and batched single-document updates.
//!
//! # Usage
//!
//! ```ignore
//! use catalog_migrate::store::{DocumentStore, Filter, FindExt, Update};
//!
//! store.update_many("file", Filter::is_null("tags"), Update::set("tags", json!([]))).await?;
//!
//! let studies = store
//!     .find_in("study")
//!     .filter(Filter::non_empty_array("variableSets"))
//!     .project(["variableSets"])
//!     .execute()
//!     .await?;
//! ```

mod document;
mod find;
mod traits;

pub mod backends;

pub use document::{
    document_id, lookup, Document, DocumentStream, Filter, Projection, Update, UpdateOne,
    UpdateOutcome, ID_FIELD,
};
pub use find::{Find, FindExt};
pub use traits::DocumentStore;
