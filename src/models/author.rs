//! Author model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Editable, Resource, AUTHORS};

/// An author. Free-form extra fields are kept alongside the named ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request body for creating an author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuthor {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request body for updating an author.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Author {
    const COLLECTION: &'static str = AUTHORS;
}

impl Editable for Author {
    type Draft = NewAuthor;
    type Patch = AuthorPatch;
    const REQUIRED: &'static [&'static str] = &["name"];
}
