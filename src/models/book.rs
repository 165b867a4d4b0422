//! Book model.
//!
//! `author_id` and `publisher_id` reference documents in the author and
//! publisher collections; they are checked when written, never afterwards.
//! The `rating_*` fields are owned by the rating aggregator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Resource, BOOKS};
use crate::catalog::tags::{deserialize_tag_list, deserialize_tag_patch};

/// A book with its running rating aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author_id: String,
    pub publisher_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rating_sum: i64,
    #[serde(default)]
    pub rating_count: i64,
    #[serde(default)]
    pub rating_avg: f64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a book.
///
/// Rating fields cannot be supplied by the caller and are stored as zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author_id: String,
    pub publisher_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_tag_list")]
    pub tags: Vec<String>,
    #[serde(skip_deserializing)]
    pub rating_sum: i64,
    #[serde(skip_deserializing)]
    pub rating_count: i64,
    #[serde(skip_deserializing)]
    pub rating_avg: f64,
}

/// Request body for updating a book.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(
        default,
        deserialize_with = "deserialize_tag_patch",
        skip_serializing_if = "Option::is_none"
    )]
    pub tags: Option<Vec<String>>,
}

impl Resource for Book {
    const COLLECTION: &'static str = BOOKS;
}

/// Rating aggregate written back to a book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingAggregate {
    pub rating_sum: i64,
    pub rating_count: i64,
    pub rating_avg: f64,
}

impl RatingAggregate {
    /// Fold one more rating into the aggregate.
    pub fn with_rating(self, rating: i64) -> Self {
        let rating_sum = self.rating_sum + rating;
        let rating_count = self.rating_count + 1;
        Self {
            rating_sum,
            rating_count,
            rating_avg: average(rating_sum, rating_count),
        }
    }
}

impl From<&Book> for RatingAggregate {
    fn from(book: &Book) -> Self {
        Self {
            rating_sum: book.rating_sum,
            rating_count: book.rating_count,
            rating_avg: book.rating_avg,
        }
    }
}

/// `sum / count`, or 0 when nothing has been rated.
pub fn average(sum: i64, count: i64) -> f64 {
    if count > 0 {
        sum as f64 / count as f64
    } else {
        0.0
    }
}
