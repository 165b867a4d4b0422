//! Generic CRUD over document collections.
//!
//! Typed records go in and out; the store only ever sees JSON field maps.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::query::{Filter, Page, Pagination};
use super::store::{Document, DocumentStore, Fields, CREATED_AT, UPDATED_AT};
use crate::errors::{AppError, AppResult};
use crate::models::{Editable, Resource};

/// Repository for all resource operations.
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// List one page of the documents matching every filter.
    pub async fn list<R: Resource>(
        &self,
        filters: &[Filter],
        pagination: Pagination,
    ) -> AppResult<Page<R>> {
        let matching: Vec<Document> = self
            .store
            .list(R::COLLECTION)
            .await?
            .into_iter()
            .filter(|doc| filters.iter().all(|f| f.matches(&doc.fields)))
            .collect();

        let page = pagination.apply(matching);
        let items = page
            .items
            .into_iter()
            .map(R::from_document)
            .collect::<AppResult<Vec<R>>>()?;

        Ok(Page {
            items,
            total: page.total,
            limit: page.limit,
            offset: page.offset,
            has_more: page.has_more,
        })
    }

    /// List a whole collection.
    pub async fn list_all<R: Resource>(&self) -> AppResult<Vec<R>> {
        self.store
            .list(R::COLLECTION)
            .await?
            .into_iter()
            .map(R::from_document)
            .collect()
    }

    pub async fn find<R: Resource>(&self, id: &str) -> AppResult<Option<R>> {
        self.store
            .get(R::COLLECTION, id)
            .await?
            .map(R::from_document)
            .transpose()
    }

    pub async fn get<R: Resource>(&self, id: &str) -> AppResult<R> {
        self.find(id).await?.ok_or_else(AppError::not_found)
    }

    pub async fn exists(&self, collection: &str, id: &str) -> AppResult<bool> {
        Ok(self.store.get(collection, id).await?.is_some())
    }

    /// Validate a create body and store it.
    pub async fn create<R: Editable>(&self, fields: Fields) -> AppResult<R> {
        require_fields(&fields, R::REQUIRED)?;
        let draft: R::Draft = decode(fields)?;
        self.insert(&draft).await
    }

    /// Store an already validated record.
    pub async fn insert<R: Resource, T: Serialize>(&self, record: &T) -> AppResult<R> {
        let doc = self.store.create(R::COLLECTION, encode(record)?).await?;
        R::from_document(doc)
    }

    /// Validate a patch body and merge it.
    pub async fn update<R: Editable>(&self, id: &str, fields: Fields) -> AppResult<R> {
        let patch: R::Patch = decode(fields)?;
        self.apply(id, &patch).await
    }

    /// Merge an already validated patch.
    pub async fn apply<R: Resource, T: Serialize>(&self, id: &str, patch: &T) -> AppResult<R> {
        match self.store.update(R::COLLECTION, id, encode(patch)?).await? {
            Some(doc) => R::from_document(doc),
            None => Err(AppError::not_found()),
        }
    }

    pub async fn delete<R: Resource>(&self, id: &str) -> AppResult<()> {
        if self.store.delete(R::COLLECTION, id).await? {
            Ok(())
        } else {
            Err(AppError::not_found())
        }
    }
}

/// Reject a body in which any required field is missing or falsy, naming all of them.
pub fn require_fields(fields: &Fields, required: &[&str]) -> AppResult<()> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| !fields.get(*name).is_some_and(is_truthy))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Missing required field(s): {}",
            missing.join(", ")
        )))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Decode a request body into its typed form.
pub fn decode<T: DeserializeOwned>(fields: Fields) -> AppResult<T> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))
}

/// Encode a typed record into store fields, dropping store-owned keys.
fn encode<T: Serialize>(record: &T) -> AppResult<Fields> {
    match serde_json::to_value(record)? {
        Value::Object(mut fields) => {
            for key in ["id", CREATED_AT, UPDATED_AT] {
                fields.remove(key);
            }
            Ok(fields)
        }
        other => Err(AppError::Internal(format!(
            "Expected a JSON object, got {}",
            other
        ))),
    }
}
