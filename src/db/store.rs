//! Document store abstraction.
//!
//! A store holds named collections of schema-less JSON documents. Every
//! single-document operation is atomic; nothing spans more than one document.
//! Writers that need read-modify-write semantics use [`DocumentStore::compare_and_update`]
//! and retry on [`CasOutcome::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// Field map of a stored document. The `id` is kept outside the map.
pub type Fields = Map<String, Value>;

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

/// Errors raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend failure: {0}")]
    Backend(#[from] sqlx::Error),

    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("document {collection}/{id} is corrupt: {reason}")]
    Corrupt {
        collection: String,
        id: String,
        reason: String,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    /// Starts at 1 and increments on every successful write.
    pub version: i64,
    pub fields: Fields,
}

impl Document {
    /// Flatten into a JSON object with the id folded in.
    pub fn into_json(self) -> Value {
        let mut fields = self.fields;
        fields.insert("id".to_string(), Value::String(self.id));
        Value::Object(fields)
    }
}

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq)]
pub enum CasOutcome {
    Updated(Document),
    Missing,
    Conflict { current_version: i64 },
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// All documents of a collection in insertion order.
    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>>;

    /// Store a new document under a fresh identifier.
    async fn create(&self, collection: &str, fields: Fields) -> StoreResult<Document>;

    /// Store a document under a caller-chosen identifier, replacing any existing one.
    async fn insert(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<Document>;

    /// Merge `patch` into the document only if it is still at `expected_version`.
    async fn compare_and_update(
        &self,
        collection: &str,
        id: &str,
        expected_version: i64,
        patch: Fields,
    ) -> StoreResult<CasOutcome>;

    /// Returns whether a document existed and was removed.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool>;

    /// Verify the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;

    /// Merge `patch` into an existing document, refreshing `updatedAt`.
    ///
    /// Returns `None` without side effects when the document does not exist.
    async fn update(&self, collection: &str, id: &str, patch: Fields) -> StoreResult<Option<Document>> {
        loop {
            let Some(current) = self.get(collection, id).await? else {
                return Ok(None);
            };
            match self
                .compare_and_update(collection, id, current.version, patch.clone())
                .await?
            {
                CasOutcome::Updated(doc) => return Ok(Some(doc)),
                CasOutcome::Missing => return Ok(None),
                CasOutcome::Conflict { current_version } => {
                    tracing::debug!(
                        collection,
                        id,
                        current_version,
                        "concurrent write, retrying merge"
                    );
                }
            }
        }
    }
}

/// Stamp a new document's creation and modification times.
pub(crate) fn stamp_new(fields: &mut Fields, now: DateTime<Utc>) {
    let ts = timestamp(now);
    fields.insert(CREATED_AT.to_string(), ts.clone());
    fields.insert(UPDATED_AT.to_string(), ts);
}

/// Shallow-merge `patch` into `fields` and refresh `updatedAt`.
pub(crate) fn merge_patch(fields: &mut Fields, patch: Fields, now: DateTime<Utc>) {
    for (key, value) in patch {
        if key == "id" || key == CREATED_AT {
            continue;
        }
        fields.insert(key, value);
    }
    fields.insert(UPDATED_AT.to_string(), timestamp(now));
}

fn timestamp(now: DateTime<Utc>) -> Value {
    Value::String(now.to_rfc3339())
}
