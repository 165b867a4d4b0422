//! Borrow request model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Resource, BORROW_REQUESTS};

/// Lifecycle state of a borrow request. Requests are only ever recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorrowStatus {
    Pending,
}

/// A recorded borrow request. `book_title` is a snapshot taken at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorrowRequest {
    pub id: String,
    pub book_id: String,
    pub book_title: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub notes: String,
    pub status: BorrowStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Stored fields of a new borrow request.
#[derive(Debug, Clone, Serialize)]
pub struct BorrowRecord {
    pub book_id: String,
    pub book_title: String,
    pub name: String,
    pub email: String,
    pub notes: String,
    pub status: BorrowStatus,
}

impl Resource for BorrowRequest {
    const COLLECTION: &'static str = BORROW_REQUESTS;
}
