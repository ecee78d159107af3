//! Typed views of the catalog documents touched by the migration.
//!
//! Only the fields a step reads or writes are modelled. Catalog documents
//! are schema-less: values a step compares or copies are kept as raw JSON
//! so that absent, null or wrong-typed fields are skipped, not fatal.

mod individual;
mod user;
mod variable_set;

pub use individual::{IndividualSamples, SampleOwnership, SampleRef};
pub use user::{AdminCredentials, AdminUser, ADMIN_USER_ID};
pub use variable_set::{rewrite_variable_types, LEGACY_TEXT_TYPE, STRING_TYPE};

use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::store::{document_id, Document};

/// Catalog collection names.
pub mod collections {
    pub const SAMPLE: &str = "sample";
    pub const INDIVIDUAL: &str = "individual";
    pub const FILE: &str = "file";
    pub const DATASET: &str = "dataset";
    pub const USER: &str = "user";
    pub const METADATA: &str = "metadata";
    pub const STUDY: &str = "study";
}

/// Deserializes a stored document into a typed view.
///
/// # Errors
///
/// Returns [`AppError::MalformedDocument`] naming the collection and `_id`
/// when the document does not have the expected shape.
pub fn from_document<T: DeserializeOwned>(collection: &str, doc: &Document) -> Result<T, AppError> {
    serde_json::from_value(serde_json::Value::Object(doc.clone()))
        .map_err(|e| AppError::malformed(collection, document_id(doc), e))
}
