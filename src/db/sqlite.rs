//! SQLite-backed document store.
//!
//! All collections share one `documents` table keyed by `(collection, id)`.
//! Document bodies are stored as JSON text next to a version counter used
//! for conditional writes.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use super::store::{
    merge_patch, stamp_new, CasOutcome, Document, DocumentStore, Fields, StoreError, StoreResult,
};

/// Document store over a SQLite connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let row = sqlx::query(
            "SELECT id, data, version FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref()
            .map(|row| document_from_row(collection, row))
            .transpose()
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let rows = sqlx::query(
            "SELECT id, data, version FROM documents WHERE collection = ? ORDER BY seq",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| document_from_row(collection, row))
            .collect()
    }

    async fn create(&self, collection: &str, fields: Fields) -> StoreResult<Document> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.insert(collection, &id, fields).await
    }

    async fn insert(&self, collection: &str, id: &str, mut fields: Fields) -> StoreResult<Document> {
        stamp_new(&mut fields, Utc::now());
        let data = serde_json::to_string(&fields)?;

        sqlx::query(
            r#"INSERT INTO documents (collection, id, data, version) VALUES (?, ?, ?, 1)
               ON CONFLICT (collection, id) DO UPDATE SET data = excluded.data, version = 1"#,
        )
        .bind(collection)
        .bind(id)
        .bind(&data)
        .execute(&self.pool)
        .await?;

        Ok(Document {
            id: id.to_string(),
            version: 1,
            fields,
        })
    }

    async fn compare_and_update(
        &self,
        collection: &str,
        id: &str,
        expected_version: i64,
        patch: Fields,
    ) -> StoreResult<CasOutcome> {
        let Some(mut current) = self.get(collection, id).await? else {
            return Ok(CasOutcome::Missing);
        };
        if current.version != expected_version {
            return Ok(CasOutcome::Conflict {
                current_version: current.version,
            });
        }

        merge_patch(&mut current.fields, patch, Utc::now());
        let data = serde_json::to_string(&current.fields)?;
        let new_version = expected_version + 1;

        // Conditional UPDATE guards against a writer slipping in after the read
        let result = sqlx::query(
            "UPDATE documents SET data = ?, version = ? WHERE collection = ? AND id = ? AND version = ?",
        )
        .bind(&data)
        .bind(new_version)
        .bind(collection)
        .bind(id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(match self.get(collection, id).await? {
                Some(doc) => CasOutcome::Conflict {
                    current_version: doc.version,
                },
                None => CasOutcome::Missing,
            });
        }

        current.version = new_version;
        Ok(CasOutcome::Updated(current))
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn document_from_row(collection: &str, row: &sqlx::sqlite::SqliteRow) -> StoreResult<Document> {
    let id: String = row.get("id");
    let data: String = row.get("data");
    let fields: Fields = serde_json::from_str(&data).map_err(|e| StoreError::Corrupt {
        collection: collection.to_string(),
        id: id.clone(),
        reason: e.to_string(),
    })?;

    Ok(Document {
        id,
        version: row.get("version"),
        fields,
    })
}
