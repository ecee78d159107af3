//! The bootstrap administrator account.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::AppError;
use crate::models::{collections, from_document};
use crate::store::Document;

/// Identifier of the built-in administrator user.
pub const ADMIN_USER_ID: &str = "opencga";

/// Credentials and creation date donated by the metadata singleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
    pub creation_date: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataView {
    admin: Option<AdminView>,
    creation_date: Option<String>,
}

#[derive(Deserialize)]
struct AdminView {
    email: Option<String>,
    password: Option<String>,
}

impl AdminCredentials {
    /// Metadata fields erased once the administrator exists.
    pub const DONATED_FIELDS: [&'static str; 2] = ["admin.email", "admin.password"];

    /// Reads the credentials from the metadata document.
    ///
    /// # Errors
    ///
    /// [`AppError::MissingField`] when `admin.email`, `admin.password` or
    /// `creationDate` is absent or null.
    pub fn from_metadata(metadata: &Document) -> Result<Self, AppError> {
        let view: MetadataView = from_document(collections::METADATA, metadata)?;
        let missing = |field: &str| AppError::missing_field(collections::METADATA, field);

        let admin = view.admin.ok_or_else(|| missing("admin"))?;
        Ok(Self {
            email: admin.email.ok_or_else(|| missing("admin.email"))?,
            password: admin.password.ok_or_else(|| missing("admin.password"))?,
            creation_date: view.creation_date.ok_or_else(|| missing("creationDate"))?,
        })
    }
}

/// The administrator user document, in catalog v2 shape.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub organization: String,
    pub account: Account,
    pub status: Status,
    pub last_modified: String,
    pub size: i64,
    pub quota: i64,
    pub projects: Vec<JsonValue>,
    pub tools: Vec<JsonValue>,
    pub configs: Configs,
    pub attributes: Document,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "type")]
    pub kind: String,
    pub creation_date: String,
    pub expiration_date: String,
    pub auth_origin: Option<String>,
    pub authentication: Authentication,
}

#[derive(Debug, Clone, Serialize)]
pub struct Authentication {
    pub id: String,
    pub application: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub name: String,
    pub date: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Configs {
    pub filters: Vec<JsonValue>,
}

impl AdminUser {
    pub fn new(credentials: AdminCredentials) -> Self {
        let AdminCredentials {
            email,
            password,
            creation_date,
        } = credentials;

        Self {
            id: ADMIN_USER_ID.to_string(),
            name: ADMIN_USER_ID.to_string(),
            email,
            password,
            organization: String::new(),
            account: Account {
                kind: "ADMINISTRATOR".to_string(),
                creation_date: creation_date.clone(),
                expiration_date: String::new(),
                auth_origin: None,
                authentication: Authentication {
                    id: "internal".to_string(),
                    application: false,
                },
            },
            status: Status {
                name: "READY".to_string(),
                date: creation_date.clone(),
                message: String::new(),
            },
            last_modified: creation_date,
            size: -1,
            quota: -1,
            projects: Vec::new(),
            tools: Vec::new(),
            configs: Configs {
                filters: Vec::new(),
            },
            attributes: Document::new(),
        }
    }

    pub fn to_document(&self) -> Result<Document, AppError> {
        match serde_json::to_value(self) {
            Ok(JsonValue::Object(document)) => Ok(document),
            Ok(other) => Err(AppError::Internal(format!(
                "admin user serialized to a non-object: {}",
                other
            ))),
            Err(e) => Err(AppError::Internal(format!(
                "failed to serialize admin user: {}",
                e
            ))),
        }
    }
}
