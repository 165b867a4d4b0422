//! Rating log entry model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Resource, RATINGS};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// One submitted rating. The log is append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: String,
    pub book_id: String,
    pub rating: i64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Stored fields of a new rating log entry.
#[derive(Debug, Clone, Serialize)]
pub struct RatingRecord {
    pub book_id: String,
    pub rating: i64,
    pub notes: String,
    pub name: String,
}

impl Resource for Rating {
    const COLLECTION: &'static str = RATINGS;
}
