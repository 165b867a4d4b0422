//! Entity records for the library backend.
//!
//! Each entity has a full record type as read back from the store. Entities
//! managed through the generic CRUD endpoints also have a draft type (create
//! body) and a patch type (partial update body).

mod author;
mod book;
mod borrow;
mod publisher;
mod rating;
mod session;

pub use author::*;
pub use book::*;
pub use borrow::*;
pub use publisher::*;
pub use rating::*;
pub use session::*;

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::db::Document;
use crate::errors::{AppError, AppResult};

pub const AUTHORS: &str = "authors";
pub const PUBLISHERS: &str = "publishers";
pub const BOOKS: &str = "books";
pub const BORROW_REQUESTS: &str = "borrows";
pub const RATINGS: &str = "ratings";
pub const ADMIN_SESSIONS: &str = "admin_sessions";

/// A record stored in its own collection.
pub trait Resource: DeserializeOwned + Serialize + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn from_document(doc: Document) -> AppResult<Self> {
        let id = doc.id.clone();
        serde_json::from_value(doc.into_json()).map_err(|e| {
            AppError::Internal(format!(
                "Malformed document {}/{}: {}",
                Self::COLLECTION,
                id,
                e
            ))
        })
    }
}

/// A record with generic create and partial-update bodies.
pub trait Editable: Resource {
    type Draft: DeserializeOwned + Serialize + Send + Sync;
    type Patch: DeserializeOwned + Serialize + Send + Sync;

    /// Fields that must be present and truthy on create.
    const REQUIRED: &'static [&'static str];
}

/// Lenient integer coercion for request values: integers, integral floats
/// (truncated) and numeric strings are accepted.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// For patch fields that may be cleared: a present key always yields `Some`,
/// so `null` becomes `Some(None)` while an absent key stays `None`.
pub fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
