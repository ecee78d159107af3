//! Individual-to-sample ownership.
//!
//! Identifiers are copied and compared as stored, without narrowing them
//! to a Rust integer type: catalogs written by older clients hold them as
//! doubles (`1.0`) as often as integers.

use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::store::{Document, Filter};

/// Sample field holding the owning individual's numeric identifier.
pub const INDIVIDUAL_UID_FIELD: &str = "_individualUid";
/// Sample field holding the owning individual's readable identifier.
pub const INDIVIDUAL_ID_FIELD: &str = "individualId";

/// Reference from an individual to one version of a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRef {
    pub uid: JsonValue,
    pub version: JsonValue,
}

impl SampleRef {
    /// Reads a reference from one element of an individual's `samples`.
    ///
    /// Returns `None` unless the element is an object with a non-null
    /// `uid` and `version`. Other fields are ignored.
    pub fn from_value(value: &JsonValue) -> Option<Self> {
        let reference = value.as_object()?;
        let uid = reference.get("uid").filter(|v| !v.is_null())?;
        let version = reference.get("version").filter(|v| !v.is_null())?;
        Some(Self {
            uid: uid.clone(),
            version: version.clone(),
        })
    }

    /// Selects the referenced sample version.
    pub fn filter(&self) -> Filter {
        Filter::eq("uid", self.uid.clone()).and(Filter::eq("version", self.version.clone()))
    }
}

/// The projection of an individual read by the ownership backfill.
///
/// Absent fields read as `null`.
#[derive(Debug, Clone, Deserialize)]
pub struct IndividualSamples {
    #[serde(default)]
    pub uid: JsonValue,
    #[serde(default)]
    pub id: JsonValue,
    /// Anything but an array means "owns no samples".
    #[serde(default)]
    pub samples: JsonValue,
}

impl IndividualSamples {
    /// Every entry of `samples`, with `None` for unusable ones.
    pub fn samples(&self) -> Vec<Option<SampleRef>> {
        match &self.samples {
            JsonValue::Array(entries) => entries.iter().map(SampleRef::from_value).collect(),
            _ => Vec::new(),
        }
    }

    pub fn ownership(&self) -> SampleOwnership {
        SampleOwnership {
            individual_uid: self.uid.clone(),
            individual_id: self.id.clone(),
        }
    }
}

/// The denormalized owner stored on a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOwnership {
    pub individual_uid: JsonValue,
    pub individual_id: JsonValue,
}

impl SampleOwnership {
    /// Sentinel for samples that belong to no individual.
    pub fn none() -> Self {
        Self {
            individual_uid: json!(-1),
            individual_id: json!(""),
        }
    }

    /// The sample fields to `$set`.
    pub fn fields(&self) -> Document {
        Document::from_iter([
            (INDIVIDUAL_UID_FIELD.to_string(), self.individual_uid.clone()),
            (INDIVIDUAL_ID_FIELD.to_string(), self.individual_id.clone()),
        ])
    }
}
