//! Rating aggregation.
//!
//! Submissions for the same book queue on a per-book lock, then fold into the
//! book's running sum/count/average with a version-checked write and append an
//! entry to the rating log. The version check still guards against other
//! writers to the book (a PUT racing a rating): a lost race re-reads and retries.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::db::{CasOutcome, Fields, Repository};
use crate::errors::{AppError, AppResult};
use crate::models::{
    coerce_int, Book, Rating, RatingAggregate, RatingRecord, Resource, BOOKS, MAX_RATING,
    MIN_RATING,
};

/// Upper bound on optimistic retries for a single submission. Only writers
/// outside the aggregator can make a submission lose a race.
pub const MAX_ATTEMPTS: usize = 64;

/// A validated rating submission.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingSubmission {
    pub rating: i64,
    pub notes: String,
    pub name: String,
}

impl RatingSubmission {
    /// Parse a request body. Only the rating itself is validated.
    pub fn from_body(fields: &Fields) -> AppResult<Self> {
        let rating = fields
            .get("rating")
            .and_then(coerce_int)
            .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "rating must be an integer between {} and {}",
                    MIN_RATING, MAX_RATING
                ))
            })?;

        Ok(Self {
            rating,
            notes: trimmed(fields, "notes"),
            name: trimmed(fields, "name"),
        })
    }
}

fn trimmed(fields: &Fields, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string()
}

/// One async lock per book with a rating in flight.
#[derive(Clone, Default)]
struct BookLocks {
    slots: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl BookLocks {
    async fn acquire(&self, book_id: &str) -> BookGuard {
        let slot = self.slots.lock().entry(book_id.to_string()).or_default().clone();
        let guard = slot.lock_owned().await;
        BookGuard {
            slots: self.slots.clone(),
            book_id: book_id.to_string(),
            _guard: guard,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

struct BookGuard {
    slots: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
    book_id: String,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for BookGuard {
    fn drop(&mut self) {
        let mut slots = self.slots.lock();
        // The map and this guard hold the only references: nobody is waiting
        let idle = slots
            .get(&self.book_id)
            .is_some_and(|slot| Arc::strong_count(slot) == 2);
        if idle {
            slots.remove(&self.book_id);
        }
    }
}

/// Maintains per-book rating aggregates and the rating log.
#[derive(Clone)]
pub struct RatingAggregator {
    repo: Repository,
    locks: BookLocks,
}

impl RatingAggregator {
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            locks: BookLocks::default(),
        }
    }

    /// Record a rating for a book and return the book's new aggregate.
    pub async fn rate(&self, book_id: &str, submission: RatingSubmission) -> AppResult<RatingAggregate> {
        if !(MIN_RATING..=MAX_RATING).contains(&submission.rating) {
            return Err(AppError::Validation(format!(
                "rating must be an integer between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }

        let aggregate = {
            let _turn = self.locks.acquire(book_id).await;
            self.fold_into_book(book_id, submission.rating).await?
        };

        let _: Rating = self
            .repo
            .insert(&RatingRecord {
                book_id: book_id.to_string(),
                rating: submission.rating,
                notes: submission.notes,
                name: submission.name,
            })
            .await?;

        tracing::debug!(
            book_id,
            rating_count = aggregate.rating_count,
            rating_avg = aggregate.rating_avg,
            "rating recorded"
        );
        Ok(aggregate)
    }

    async fn fold_into_book(&self, book_id: &str, rating: i64) -> AppResult<RatingAggregate> {
        let store = self.repo.store();

        for attempt in 1..=MAX_ATTEMPTS {
            let Some(doc) = store.get(BOOKS, book_id).await? else {
                return Err(AppError::NotFound("Book not found".to_string()));
            };
            let version = doc.version;
            let next = RatingAggregate::from(&Book::from_document(doc)?).with_rating(rating);

            match store
                .compare_and_update(BOOKS, book_id, version, aggregate_fields(&next))
                .await?
            {
                CasOutcome::Updated(_) => return Ok(next),
                CasOutcome::Missing => {
                    return Err(AppError::NotFound("Book not found".to_string()))
                }
                CasOutcome::Conflict { current_version } => {
                    tracing::debug!(
                        book_id,
                        attempt,
                        read_version = version,
                        current_version,
                        "rating lost a race, retrying"
                    );
                    tokio::task::yield_now().await;
                }
            }
        }

        tracing::warn!(book_id, "rating abandoned after {} attempts", MAX_ATTEMPTS);
        Err(AppError::Conflict(
            "Too many concurrent ratings for this book, try again".to_string(),
        ))
    }
}

fn aggregate_fields(aggregate: &RatingAggregate) -> Fields {
    let mut fields = Fields::new();
    fields.insert("rating_sum".to_string(), aggregate.rating_sum.into());
    fields.insert("rating_count".to_string(), aggregate.rating_count.into());
    fields.insert("rating_avg".to_string(), aggregate.rating_avg.into());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_database, DocumentStore, MemoryStore, SqliteStore};
    use crate::models::{NewBook, RATINGS};
    use serde_json::json;
    use tempfile::TempDir;
    use tokio::task::JoinSet;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn submission(rating: i64) -> RatingSubmission {
        RatingSubmission {
            rating,
            notes: String::new(),
            name: String::new(),
        }
    }

    async fn setup() -> (RatingAggregator, Repository, String) {
        setup_with(Arc::new(MemoryStore::new())).await
    }

    async fn setup_with(store: Arc<dyn DocumentStore>) -> (RatingAggregator, Repository, String) {
        let repo = Repository::new(store);
        let book: Book = repo
            .insert(&NewBook {
                title: "Dune".to_string(),
                author_id: "a".to_string(),
                publisher_id: "p".to_string(),
                year: None,
                tags: Vec::new(),
                rating_sum: 0,
                rating_count: 0,
                rating_avg: 0.0,
            })
            .await
            .unwrap();
        (RatingAggregator::new(repo.clone()), repo, book.id)
    }

    #[test]
    fn test_submission_parsing() {
        let parsed =
            RatingSubmission::from_body(&fields(json!({ "rating": "4", "notes": " ok ", "name": 3 })))
                .unwrap();
        assert_eq!(parsed.rating, 4);
        assert_eq!(parsed.notes, "ok");
        assert_eq!(parsed.name, "");

        for bad in [json!(0), json!(6), json!("abc"), json!(null)] {
            let err = RatingSubmission::from_body(&fields(json!({ "rating": bad }))).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert!(RatingSubmission::from_body(&Fields::new()).is_err());
    }

    #[tokio::test]
    async fn test_sequential_ratings_accumulate() {
        let (aggregator, repo, book_id) = setup().await;

        for r in [5, 3, 4] {
            aggregator.rate(&book_id, submission(r)).await.unwrap();
        }

        let book: Book = repo.get(&book_id).await.unwrap();
        assert_eq!(book.rating_sum, 12);
        assert_eq!(book.rating_count, 3);
        assert_eq!(book.rating_avg, 4.0);

        let log = repo.store().list(RATINGS).await.unwrap();
        assert_eq!(log.len(), 3);
        assert!(log.iter().all(|d| d.fields["book_id"] == json!(book_id)));
    }

    #[tokio::test]
    async fn test_unknown_book_is_not_found_and_logs_nothing() {
        let (aggregator, repo, _) = setup().await;
        let err = aggregator.rate("ghost", submission(5)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(repo.store().list(RATINGS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_rating_is_rejected() {
        let (aggregator, _, book_id) = setup().await;
        let err = aggregator.rate(&book_id, submission(9)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    async fn rate_concurrently(aggregator: &RatingAggregator, book_id: &str, concurrency: i64) {
        let mut set = JoinSet::new();
        for i in 0..concurrency {
            let aggregator = aggregator.clone();
            let book_id = book_id.to_string();
            set.spawn(async move { aggregator.rate(&book_id, submission(i % 5 + 1)).await });
        }
        while let Some(result) = set.join_next().await {
            result.expect("task should not panic").expect("rating should succeed");
        }
    }

    async fn assert_all_counted(repo: &Repository, book_id: &str, concurrency: i64) {
        let expected_sum: i64 = (0..concurrency).map(|i| i % 5 + 1).sum();
        let book: Book = repo.get(book_id).await.unwrap();
        assert_eq!(book.rating_count, concurrency);
        assert_eq!(book.rating_sum, expected_sum);
        assert_eq!(
            book.rating_avg,
            expected_sum as f64 / concurrency as f64
        );
        assert_eq!(
            repo.store().list(RATINGS).await.unwrap().len(),
            concurrency as usize
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_ratings_are_not_lost() {
        for concurrency in [2_i64, 8, 32, 300] {
            let (aggregator, repo, book_id) = setup().await;
            rate_concurrently(&aggregator, &book_id, concurrency).await;
            assert_all_counted(&repo, &book_id, concurrency).await;
            assert_eq!(aggregator.locks.len(), 0);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_ratings_on_sqlite_all_succeed() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("ratings.sqlite"))
            .await
            .expect("Failed to init DB");
        let (aggregator, repo, book_id) = setup_with(Arc::new(SqliteStore::new(pool))).await;

        rate_concurrently(&aggregator, &book_id, 300).await;
        assert_all_counted(&repo, &book_id, 300).await;
        assert_eq!(aggregator.locks.len(), 0);
    }

    #[tokio::test]
    async fn test_rating_survives_concurrent_book_edit() {
        let (aggregator, repo, book_id) = setup().await;

        let edit = {
            let repo = repo.clone();
            let book_id = book_id.clone();
            tokio::spawn(async move {
                repo.store()
                    .update(BOOKS, &book_id, fields(json!({ "title": "Dune Messiah" })))
                    .await
            })
        };
        aggregator.rate(&book_id, submission(4)).await.unwrap();
        edit.await.unwrap().unwrap();

        let book: Book = repo.get(&book_id).await.unwrap();
        assert_eq!(book.title, "Dune Messiah");
        assert_eq!(book.rating_count, 1);
        assert_eq!(book.rating_sum, 4);
    }
}
