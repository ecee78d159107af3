//! MongoDB backend implementation.
//!
//! Documents cross the boundary as relaxed extended JSON: BSON values are
//! rendered with [`Bson::into_relaxed_extjson`] on the way out and parsed
//! back with `Bson::try_from` on the way in, so ObjectIds and dates survive
//! a read-modify-write cycle. 64-bit integers are the exception: they are
//! rendered in canonical form (`{"$numberLong": "7"}`) because a plain JSON
//! integer is written back as Int32 whenever it fits.
//!
//! # Example
//!
//! ```ignore
//! use catalog_migrate::store::backends::mongo::MongoStore;
//! use catalog_migrate::store::FindExt;
//!
//! let store = MongoStore::connect("mongodb://localhost:27017", "opencga_catalog").await?;
//! let users = store.find_in("user").fetch_all().await?;
//! ```

use async_trait::async_trait;
use bson::{doc, Bson};
use futures::{StreamExt, TryStreamExt};
use mongodb::options::FindOptions;
use mongodb::{Client, Collection, Database};
use serde_json::{json, Value as JsonValue};

use crate::error::AppError;
use crate::store::document::{
    Document, DocumentStream, Filter, Projection, Update, UpdateOne, UpdateOutcome,
};
use crate::store::traits::DocumentStore;

/// MongoDB document store bound to one database.
///
/// This type is cheap to clone - the driver's connection pool is shared.
#[derive(Clone)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Connects to the server and selects `database`.
    ///
    /// The driver connects lazily; a `ping` is issued so that bad
    /// credentials or an unreachable server fail here rather than in the
    /// first migration step.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        let client = Client::with_uri_str(uri).await?;
        let database = client.database(database);
        database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(Self { database })
    }

    /// Wraps an already selected database.
    pub fn from_database(database: Database) -> Self {
        Self { database }
    }

    /// Returns the selected database name.
    pub fn database_name(&self) -> &str {
        self.database.name()
    }

    fn collection(&self, name: &str) -> Collection<bson::Document> {
        self.database.collection(name)
    }
}

// ----------------------------------------------------------------------------
// Conversions
// ----------------------------------------------------------------------------

fn to_bson(value: JsonValue) -> Result<Bson, AppError> {
    Ok(Bson::try_from(value)?)
}

fn to_bson_document(document: Document) -> Result<bson::Document, AppError> {
    match to_bson(JsonValue::Object(document))? {
        Bson::Document(document) => Ok(document),
        other => Err(AppError::Bson(format!(
            "expected a document, got {:?}",
            other.element_type()
        ))),
    }
}

fn from_bson_document(document: bson::Document) -> Result<Document, AppError> {
    match from_bson(Bson::Document(document)) {
        JsonValue::Object(map) => Ok(map),
        other => Err(AppError::Bson(format!("expected an object, got {}", other))),
    }
}

fn from_bson(value: Bson) -> JsonValue {
    match value {
        Bson::Int64(n) => json!({ "$numberLong": n.to_string() }),
        Bson::Document(document) => JsonValue::Object(
            document
                .into_iter()
                .map(|(key, value)| (key, from_bson(value)))
                .collect(),
        ),
        Bson::Array(values) => JsonValue::Array(values.into_iter().map(from_bson).collect()),
        other => other.into_relaxed_extjson(),
    }
}

/// Translates a filter into a MongoDB query document.
fn filter_to_bson(filter: &Filter) -> Result<bson::Document, AppError> {
    let mut query = bson::Document::new();
    match filter {
        Filter::All => {}
        Filter::Eq(path, value) => {
            query.insert(path.clone(), to_bson(value.clone())?);
        }
        // `{field: null}` would also match absent fields
        Filter::IsNull(path) => {
            query.insert(path.clone(), doc! { "$type": "null" });
        }
        Filter::NonEmptyArray(path) => {
            query.insert(path.clone(), doc! { "$type": "array", "$ne": [] });
        }
        Filter::And(filters) if filters.is_empty() => {}
        Filter::And(filters) => {
            let clauses = filters
                .iter()
                .map(|f| filter_to_bson(f).map(Bson::Document))
                .collect::<Result<Vec<_>, _>>()?;
            query.insert("$and", clauses);
        }
    }
    Ok(query)
}

/// Translates an update into a MongoDB update document.
fn update_to_bson(update: &Update) -> Result<bson::Document, AppError> {
    match update {
        Update::Set(fields) => Ok(doc! { "$set": to_bson_document(fields.clone())? }),
        Update::Unset(paths) => {
            let fields: bson::Document = paths
                .iter()
                .map(|path| (path.clone(), Bson::String(String::new())))
                .collect();
            Ok(doc! { "$unset": fields })
        }
    }
}

fn projection_to_bson(projection: &Projection) -> bson::Document {
    projection
        .field_names()
        .map(|field| (field.to_string(), Bson::Int32(1)))
        .collect()
}

/// Reads an integer counter from a command reply.
fn reply_count(reply: &bson::Document, key: &str) -> u64 {
    match reply.get(key) {
        Some(Bson::Int32(n)) => *n as u64,
        Some(Bson::Int64(n)) => *n as u64,
        Some(Bson::Double(n)) => *n as u64,
        _ => 0,
    }
}

/// Reads the counters of an `update` command reply, failing on any write
/// or write concern error it reports.
fn bulk_outcome(collection: &str, reply: &bson::Document) -> Result<UpdateOutcome, AppError> {
    if let Ok(errors) = reply.get_array("writeErrors") {
        if let Some(Bson::Document(first)) = errors.first() {
            return Err(AppError::BulkWrite {
                collection: collection.to_string(),
                message: format!(
                    "{} write error(s), first at index {}: {}",
                    errors.len(),
                    reply_count(first, "index"),
                    first.get_str("errmsg").unwrap_or("unknown error")
                ),
            });
        }
    }
    if let Ok(error) = reply.get_document("writeConcernError") {
        return Err(AppError::BulkWrite {
            collection: collection.to_string(),
            message: format!(
                "write concern error {}: {}",
                reply_count(error, "code"),
                error.get_str("errmsg").unwrap_or("unknown error")
            ),
        });
    }

    Ok(UpdateOutcome {
        matched: reply_count(reply, "n"),
        modified: reply_count(reply, "nModified"),
    })
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find(
        &self,
        collection: &str,
        filter: Filter,
        projection: Option<Projection>,
    ) -> Result<DocumentStream<'_>, AppError> {
        let options = projection.map(|p| {
            FindOptions::builder()
                .projection(projection_to_bson(&p))
                .build()
        });
        let cursor = self
            .collection(collection)
            .find(filter_to_bson(&filter)?, options)
            .await?;

        Ok(Box::pin(
            cursor
                .map_err(AppError::from)
                .map(|result| result.and_then(from_bson_document)),
        ))
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Filter,
    ) -> Result<Option<Document>, AppError> {
        self.collection(collection)
            .find_one(filter_to_bson(&filter)?, None)
            .await?
            .map(from_bson_document)
            .transpose()
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Filter,
        update: Update,
    ) -> Result<UpdateOutcome, AppError> {
        let result = self
            .collection(collection)
            .update_many(filter_to_bson(&filter)?, update_to_bson(&update)?, None)
            .await?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), AppError> {
        self.collection(collection)
            .insert_one(to_bson_document(document)?, None)
            .await?;
        Ok(())
    }

    async fn drop_collection(&self, collection: &str) -> Result<(), AppError> {
        self.collection(collection).drop(None).await?;
        Ok(())
    }

    /// Sends the batch as a single `update` command.
    async fn bulk_update(
        &self,
        collection: &str,
        operations: Vec<UpdateOne>,
    ) -> Result<UpdateOutcome, AppError> {
        if operations.is_empty() {
            return Ok(UpdateOutcome::default());
        }

        let updates = operations
            .iter()
            .map(|op| {
                Ok(Bson::Document(doc! {
                    "q": filter_to_bson(&op.filter)?,
                    "u": update_to_bson(&op.update)?,
                    "multi": false,
                }))
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        let reply = self
            .database
            .run_command(
                doc! {
                    "update": collection,
                    "updates": updates,
                    "ordered": true,
                },
                None,
            )
            .await?;

        bulk_outcome(collection, &reply)
    }

    async fn collection_names(&self) -> Result<Vec<String>, AppError> {
        Ok(self.database.list_collection_names(None).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_null_uses_type_query() {
        let query = filter_to_bson(&Filter::is_null("tags")).unwrap();
        assert_eq!(query, doc! { "tags": { "$type": "null" } });
    }

    #[test]
    fn test_non_empty_array_query() {
        let query = filter_to_bson(&Filter::non_empty_array("variableSets")).unwrap();
        assert_eq!(
            query,
            doc! { "variableSets": { "$type": "array", "$ne": [] } }
        );
    }

    #[test]
    fn test_and_query() {
        let query = filter_to_bson(&Filter::eq("uid", 7).and(Filter::eq("version", 1))).unwrap();
        assert_eq!(
            query,
            doc! { "$and": [ { "uid": 7 }, { "version": 1 } ] }
        );
    }

    #[test]
    fn test_object_id_filter_round_trips() {
        let oid = bson::oid::ObjectId::new();
        let id = Bson::ObjectId(oid).into_relaxed_extjson();
        let query = filter_to_bson(&Filter::by_id(id)).unwrap();
        assert_eq!(query, doc! { "_id": oid });
    }

    #[test]
    fn test_unset_update() {
        let update = update_to_bson(&Update::unset(["admin.email", "admin.password"])).unwrap();
        assert_eq!(
            update,
            doc! { "$unset": { "admin.email": "", "admin.password": "" } }
        );
    }

    #[test]
    fn test_set_update() {
        let update = update_to_bson(&Update::set("tags", json!([]))).unwrap();
        assert_eq!(update, doc! { "$set": { "tags": [] } });
    }

    #[test]
    fn test_projection() {
        let projection = projection_to_bson(&Projection::fields(["samples", "uid", "id"]));
        assert_eq!(projection, doc! { "samples": 1, "uid": 1, "id": 1 });
    }

    #[test]
    fn test_document_conversion_keeps_field_order() {
        let original = doc! { "z": 1, "a": "x", "nested": { "b": true } };
        let json = from_bson_document(original.clone()).unwrap();
        let keys: Vec<_> = json.keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a", "nested"]);
        assert_eq!(to_bson_document(json).unwrap(), original);
    }

    #[test]
    fn test_int64_survives_round_trip() {
        let original = doc! {
            "uid": 7_i64,
            "version": 1_i32,
            "ratio": 1.0,
            "variables": [ { "uid": 8_i64, "type": "TEXT" } ]
        };
        let json = from_bson_document(original.clone()).unwrap();
        assert_eq!(json["uid"], json!({ "$numberLong": "7" }));
        assert_eq!(json["version"], json!(1));
        assert_eq!(to_bson_document(json).unwrap(), original);
    }

    #[test]
    fn test_bulk_outcome_counts() {
        let reply = doc! { "n": 3, "nModified": 2, "ok": 1.0 };
        assert_eq!(
            bulk_outcome("study", &reply).unwrap(),
            UpdateOutcome { matched: 3, modified: 2 }
        );
    }

    #[test]
    fn test_bulk_outcome_write_error() {
        let reply = doc! {
            "n": 0,
            "nModified": 0,
            "writeErrors": [ { "index": 1, "code": 2, "errmsg": "bad update" } ],
            "ok": 1.0
        };
        let err = bulk_outcome("study", &reply).unwrap_err();
        assert!(matches!(err, AppError::BulkWrite { ref message, .. } if message.contains("bad update")));
    }

    #[test]
    fn test_bulk_outcome_write_concern_error() {
        let reply = doc! {
            "n": 2,
            "nModified": 2,
            "writeConcernError": { "code": 64, "errmsg": "waiting for replication timed out" },
            "ok": 1.0
        };
        let err = bulk_outcome("study", &reply).unwrap_err();
        assert!(matches!(
            err,
            AppError::BulkWrite { ref collection, ref message }
                if collection == "study" && message.contains("replication timed out")
        ));
    }
}
