//! In-memory document store.
//!
//! Thread-safe via [`parking_lot::RwLock`]; every operation takes the lock
//! once, so each single-document operation is atomic. Data is lost when the
//! process exits. Used by unit tests.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::store::{
    merge_patch, stamp_new, CasOutcome, Document, DocumentStore, Fields, StoreResult,
};

#[derive(Default)]
struct Collection {
    next_seq: u64,
    docs: HashMap<String, (u64, Document)>,
}

/// In-memory store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .and_then(|c| c.docs.get(id))
            .map(|(_, doc)| doc.clone()))
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read();
        let Some(c) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        let mut entries: Vec<&(u64, Document)> = c.docs.values().collect();
        entries.sort_by_key(|(seq, _)| *seq);
        Ok(entries.into_iter().map(|(_, doc)| doc.clone()).collect())
    }

    async fn create(&self, collection: &str, fields: Fields) -> StoreResult<Document> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.insert(collection, &id, fields).await
    }

    async fn insert(&self, collection: &str, id: &str, mut fields: Fields) -> StoreResult<Document> {
        stamp_new(&mut fields, Utc::now());
        let doc = Document {
            id: id.to_string(),
            version: 1,
            fields,
        };

        let mut collections = self.collections.write();
        let c = collections.entry(collection.to_string()).or_default();
        let seq = match c.docs.get(id) {
            Some((seq, _)) => *seq,
            None => {
                c.next_seq += 1;
                c.next_seq
            }
        };
        c.docs.insert(id.to_string(), (seq, doc.clone()));
        Ok(doc)
    }

    async fn compare_and_update(
        &self,
        collection: &str,
        id: &str,
        expected_version: i64,
        patch: Fields,
    ) -> StoreResult<CasOutcome> {
        let mut collections = self.collections.write();
        let Some((_, doc)) = collections
            .get_mut(collection)
            .and_then(|c| c.docs.get_mut(id))
        else {
            return Ok(CasOutcome::Missing);
        };
        if doc.version != expected_version {
            return Ok(CasOutcome::Conflict {
                current_version: doc.version,
            });
        }

        merge_patch(&mut doc.fields, patch, Utc::now());
        doc.version += 1;
        Ok(CasOutcome::Updated(doc.clone()))
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut collections = self.collections.write();
        Ok(collections
            .get_mut(collection)
            .and_then(|c| c.docs.remove(id))
            .is_some())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_create_get_round_trip() {
        let store = MemoryStore::new();
        let doc = store
            .create("authors", fields(json!({ "name": "A" })))
            .await
            .unwrap();

        assert!(!doc.id.is_empty());
        assert_eq!(doc.version, 1);
        assert_eq!(doc.fields["createdAt"], doc.fields["updatedAt"]);

        let fetched = store.get("authors", &doc.id).await.unwrap().unwrap();
        assert_eq!(fetched, doc);
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let store = MemoryStore::new();
        for name in ["a", "b", "c"] {
            store
                .create("authors", fields(json!({ "name": name })))
                .await
                .unwrap();
        }
        let names: Vec<Value> = store
            .list("authors")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.fields["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("a"), json!("b"), json!("c")]);
        assert!(store.list("publishers").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_and_bumps_version() {
        let store = MemoryStore::new();
        let doc = store
            .create("publishers", fields(json!({ "name": "P", "city": "Oslo" })))
            .await
            .unwrap();

        let updated = store
            .update("publishers", &doc.id, fields(json!({ "name": "Q" })))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.version, 2);
        assert_eq!(updated.fields["name"], "Q");
        assert_eq!(updated.fields["city"], "Oslo");
        assert_eq!(updated.fields["createdAt"], doc.fields["createdAt"]);
    }

    #[tokio::test]
    async fn test_update_missing_has_no_side_effects() {
        let store = MemoryStore::new();
        let result = store
            .update("authors", "nope", fields(json!({ "name": "X" })))
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(store.list("authors").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_compare_and_update_detects_stale_version() {
        let store = MemoryStore::new();
        let doc = store
            .create("books", fields(json!({ "rating_count": 0 })))
            .await
            .unwrap();

        let first = store
            .compare_and_update("books", &doc.id, 1, fields(json!({ "rating_count": 1 })))
            .await
            .unwrap();
        assert!(matches!(first, CasOutcome::Updated(_)));

        let stale = store
            .compare_and_update("books", &doc.id, 1, fields(json!({ "rating_count": 1 })))
            .await
            .unwrap();
        assert_eq!(stale, CasOutcome::Conflict { current_version: 2 });

        let missing = store
            .compare_and_update("books", "nope", 1, Fields::new())
            .await
            .unwrap();
        assert_eq!(missing, CasOutcome::Missing);
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let store = MemoryStore::new();
        let doc = store.create("authors", Fields::new()).await.unwrap();
        assert!(store.delete("authors", &doc.id).await.unwrap());
        assert!(!store.delete("authors", &doc.id).await.unwrap());
        assert!(store.get("authors", &doc.id).await.unwrap().is_none());
    }
}
