//! Book catalogue services.
//!
//! Book writes pass through field validation, the reference validator and
//! the tag sanitizer before reaching the repository. Ratings and borrow
//! requests have their own recorders.

pub mod borrows;
pub mod integrity;
pub mod ratings;
pub mod tags;

pub use borrows::BorrowRecorder;
pub use integrity::{ReferenceValidator, BOOK_REFERENCES};
pub use ratings::{RatingAggregator, RatingSubmission};

use serde_json::Value;

use crate::db::{decode, require_fields, Fields, Repository};
use crate::errors::{AppError, AppResult};
use crate::models::{coerce_int, Book, BookPatch, NewBook};

const BOOK_REQUIRED: &[&str] = &["title", "author_id", "publisher_id"];

/// Validated create/update for books.
#[derive(Clone)]
pub struct BookCatalog {
    repo: Repository,
    references: ReferenceValidator,
}

impl BookCatalog {
    pub fn new(repo: Repository) -> Self {
        let references = ReferenceValidator::new(repo.clone(), BOOK_REFERENCES);
        Self { repo, references }
    }

    pub async fn create(&self, mut fields: Fields) -> AppResult<Book> {
        require_fields(&fields, BOOK_REQUIRED)?;
        coerce_year(&mut fields)?;
        let mut draft: NewBook = decode(fields.clone())?;

        self.references.check_all(&fields).await?;
        draft.tags = tags::sanitize(&draft.tags);

        let book: Book = self.repo.insert(&draft).await?;
        tracing::info!(book_id = %book.id, "book created");
        Ok(book)
    }

    /// Partial update. References are re-checked only when the patch names them.
    pub async fn update(&self, id: &str, mut fields: Fields) -> AppResult<Book> {
        coerce_year(&mut fields)?;
        let mut patch: BookPatch = decode(fields.clone())?;

        self.references.check_present(&fields).await?;
        if let Some(list) = patch.tags.take() {
            patch.tags = Some(tags::sanitize(&list));
        }

        self.repo.apply(id, &patch).await
    }
}

/// Replace a present `year` with its integer value.
fn coerce_year(fields: &mut Fields) -> AppResult<()> {
    if let Some(value) = fields.get_mut("year") {
        let year = coerce_int(value)
            .ok_or_else(|| AppError::Validation("year must be an integer".to_string()))?;
        *value = Value::from(year);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{Author, Publisher};
    use serde_json::json;
    use std::sync::Arc;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    async fn setup() -> (BookCatalog, Repository, String, String) {
        let repo = Repository::new(Arc::new(MemoryStore::new()));
        let author: Author = repo.create(fields(json!({ "name": "Le Guin" }))).await.unwrap();
        let publisher: Publisher = repo.create(fields(json!({ "name": "Ace" }))).await.unwrap();
        (BookCatalog::new(repo.clone()), repo, author.id, publisher.id)
    }

    #[tokio::test]
    async fn test_create_initialises_ratings_and_sanitizes_tags() {
        let (catalog, _, author_id, publisher_id) = setup().await;

        let book = catalog
            .create(fields(json!({
                "title": "The Dispossessed",
                "author_id": author_id,
                "publisher_id": publisher_id,
                "year": "1974",
                "tags": ["Science Fiction", "Political", "science fiction", "Political", "Space"],
                "rating_sum": 99
            })))
            .await
            .unwrap();

        assert_eq!(book.year, Some(1974));
        assert_eq!(book.tags, vec!["Science Fiction", "Political"]);
        assert_eq!(book.rating_sum, 0);
        assert_eq!(book.rating_count, 0);
        assert_eq!(book.rating_avg, 0.0);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input_without_writing() {
        let (catalog, repo, author_id, publisher_id) = setup().await;

        let err = catalog.create(Fields::new()).await.unwrap_err();
        assert_eq!(
            err.message(),
            "Missing required field(s): title, author_id, publisher_id"
        );

        let err = catalog
            .create(fields(json!({
                "title": "T", "author_id": "ghost", "publisher_id": publisher_id
            })))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "author_id does not exist");

        let err = catalog
            .create(fields(json!({
                "title": "T", "author_id": author_id, "publisher_id": publisher_id, "year": "soon"
            })))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "year must be an integer");

        assert!(repo.list_all::<Book>().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_checks_only_named_references() {
        let (catalog, _, author_id, publisher_id) = setup().await;
        let book = catalog
            .create(fields(json!({
                "title": "T", "author_id": author_id, "publisher_id": publisher_id, "tags": "Classic"
            })))
            .await
            .unwrap();

        let updated = catalog
            .update(&book.id, fields(json!({ "title": "T2", "tags": ["Horror", "Nope"] })))
            .await
            .unwrap();
        assert_eq!(updated.title, "T2");
        assert_eq!(updated.tags, vec!["Horror"]);
        assert_eq!(updated.author_id, author_id);

        let err = catalog
            .update(&book.id, fields(json!({ "publisher_id": "ghost" })))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "publisher_id does not exist");
    }

    #[tokio::test]
    async fn test_update_cannot_touch_rating_aggregate() {
        let (catalog, _, author_id, publisher_id) = setup().await;
        let book = catalog
            .create(fields(json!({
                "title": "T", "author_id": author_id, "publisher_id": publisher_id
            })))
            .await
            .unwrap();

        let updated = catalog
            .update(&book.id, fields(json!({ "rating_count": 50, "rating_avg": 5.0 })))
            .await
            .unwrap();
        assert_eq!(updated.rating_count, 0);
        assert_eq!(updated.rating_avg, 0.0);
    }

    #[tokio::test]
    async fn test_update_missing_book_is_not_found() {
        let (catalog, ..) = setup().await;
        let err = catalog
            .update("ghost", fields(json!({ "title": "T" })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_dangling_reference_survives_author_delete() {
        let (catalog, repo, author_id, publisher_id) = setup().await;
        let book = catalog
            .create(fields(json!({
                "title": "T", "author_id": author_id, "publisher_id": publisher_id
            })))
            .await
            .unwrap();

        repo.delete::<Author>(&author_id).await.unwrap();
        let still_there: Book = repo.get(&book.id).await.unwrap();
        assert_eq!(still_there.author_id, author_id);
    }
}
