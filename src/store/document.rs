//! Document, filter and update types shared by every store backend.
//!
//! Documents are held as `serde_json` maps in the relaxed extended-JSON
//! shape, so an ObjectId `_id` looks like `{"$oid": "..."}`. Backends
//! translate [`Filter`] and [`Update`] into their native query language;
//! the in-memory backend evaluates them directly through
//! [`Filter::matches`] and [`Update::apply`].

use std::ops::AddAssign;
use std::pin::Pin;

use futures::Stream;
use serde_json::Value as JsonValue;

use crate::error::AppError;

/// A single stored document.
pub type Document = serde_json::Map<String, JsonValue>;

/// A stream of documents from a find.
///
/// Backed by a server cursor for MongoDB, so large collections are not
/// loaded all at once.
pub type DocumentStream<'a> = Pin<Box<dyn Stream<Item = Result<Document, AppError>> + Send + 'a>>;

/// Name of the primary key field.
pub const ID_FIELD: &str = "_id";

/// Returns a printable form of a document's `_id` for logs and errors.
pub fn document_id(doc: &Document) -> String {
    match doc.get(ID_FIELD) {
        Some(JsonValue::Object(map)) => match map.get("$oid") {
            Some(JsonValue::String(oid)) => oid.clone(),
            _ => JsonValue::Object(map.clone()).to_string(),
        },
        Some(JsonValue::String(id)) => id.clone(),
        Some(other) => other.to_string(),
        None => "<no _id>".to_string(),
    }
}

// =============================================================================
// Filter
// =============================================================================

/// Document selection predicate.
///
/// Paths may be dotted (`admin.email`) and are resolved through nested
/// objects only.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    /// Field equals the value. Numbers compare by value; an array field
    /// matches when any element equals a non-array value.
    Eq(String, JsonValue),
    /// Field is present and explicitly `null`. Absent fields do not match.
    IsNull(String),
    /// Field is an array with at least one element.
    NonEmptyArray(String),
    /// Every inner filter matches.
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Filter::Eq(path.into(), value.into())
    }

    pub fn is_null(path: impl Into<String>) -> Self {
        Filter::IsNull(path.into())
    }

    pub fn non_empty_array(path: impl Into<String>) -> Self {
        Filter::NonEmptyArray(path.into())
    }

    /// Matches the document with the given `_id`.
    pub fn by_id(id: JsonValue) -> Self {
        Filter::Eq(ID_FIELD.to_string(), id)
    }

    /// Combines two filters, flattening nested conjunctions.
    pub fn and(self, other: Filter) -> Self {
        let mut filters = match self {
            Filter::All => return other,
            Filter::And(filters) => filters,
            single => vec![single],
        };
        match other {
            Filter::All => {}
            Filter::And(more) => filters.extend(more),
            single => filters.push(single),
        }
        Filter::And(filters)
    }

    /// Evaluates the filter against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(path, expected) => match lookup(doc, path) {
                Some(JsonValue::Array(items)) if !expected.is_array() => {
                    items.iter().any(|item| values_equal(item, expected))
                }
                Some(actual) => values_equal(actual, expected),
                None => expected.is_null(),
            },
            Filter::IsNull(path) => matches!(lookup(doc, path), Some(JsonValue::Null)),
            Filter::NonEmptyArray(path) => {
                matches!(lookup(doc, path), Some(JsonValue::Array(items)) if !items.is_empty())
            }
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
        }
    }
}

/// Resolves a dotted path through nested objects.
pub fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a JsonValue> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn values_equal(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        (JsonValue::Array(xs), JsonValue::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (JsonValue::Object(xs), JsonValue::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|((kx, vx), (ky, vy))| kx == ky && values_equal(vx, vy))
        }
        _ => a == b,
    }
}

// =============================================================================
// Update
// =============================================================================

/// A field-level document modification.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Sets each key to its value, creating intermediate objects for dotted keys.
    Set(Document),
    /// Removes each (possibly dotted) field if present.
    Unset(Vec<String>),
}

impl Update {
    pub fn set(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        let mut fields = Document::new();
        fields.insert(field.into(), value.into());
        Update::Set(fields)
    }

    pub fn unset<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Update::Unset(fields.into_iter().map(Into::into).collect())
    }

    /// Applies the update in place. Returns whether the document changed.
    ///
    /// Fails when a dotted `Set` path runs through a non-object value.
    pub fn apply(&self, doc: &mut Document) -> Result<bool, String> {
        let mut changed = false;
        match self {
            Update::Set(fields) => {
                for (path, value) in fields {
                    changed |= set_path(doc, path, value.clone())?;
                }
            }
            Update::Unset(paths) => {
                for path in paths {
                    changed |= unset_path(doc, path);
                }
            }
        }
        Ok(changed)
    }
}

fn set_path(doc: &mut Document, path: &str, value: JsonValue) -> Result<bool, String> {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };

    let mut target = doc;
    for segment in parents.into_iter().flat_map(|p| p.split('.')) {
        let entry = target
            .entry(segment.to_string())
            .or_insert_with(|| JsonValue::Object(Document::new()));
        target = entry
            .as_object_mut()
            .ok_or_else(|| format!("cannot create field '{}' in non-object '{}'", leaf, segment))?;
    }

    if target.get(leaf).is_some_and(|current| values_equal(current, &value)) {
        return Ok(false);
    }
    target.insert(leaf.to_string(), value);
    Ok(true)
}

fn unset_path(doc: &mut Document, path: &str) -> bool {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };

    let mut target = doc;
    for segment in parents.into_iter().flat_map(|p| p.split('.')) {
        match target.get_mut(segment).and_then(JsonValue::as_object_mut) {
            Some(next) => target = next,
            None => return false,
        }
    }
    target.remove(leaf).is_some()
}

// =============================================================================
// Projection, bulk operations, outcomes
// =============================================================================

/// Top-level fields to return from a find. `_id` is always included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection(Vec<String>);

impl Projection {
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Narrows a document to the projected fields.
    pub fn apply(&self, doc: &Document) -> Document {
        doc.iter()
            .filter(|(key, _)| key.as_str() == ID_FIELD || self.0.iter().any(|f| f == *key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// One staged update of a bulk request: modifies the first matching document.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOne {
    pub filter: Filter,
    pub update: Update,
}

impl UpdateOne {
    pub fn new(filter: Filter, update: Update) -> Self {
        Self { filter, update }
    }
}

/// Matched and modified document counts of a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

impl AddAssign for UpdateOutcome {
    fn add_assign(&mut self, other: Self) {
        self.matched += other.matched;
        self.modified += other.modified;
    }
}
