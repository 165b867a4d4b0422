//! Borrow request recording.

use serde::Deserialize;

use crate::db::{decode, require_fields, Fields, Repository};
use crate::errors::{AppError, AppResult};
use crate::models::{Book, BorrowRecord, BorrowRequest, BorrowStatus};

const REQUIRED: &[&str] = &["name", "email"];

#[derive(Debug, Deserialize)]
struct BorrowForm {
    name: String,
    email: String,
    #[serde(default)]
    notes: Option<String>,
}

/// Appends borrow requests; recorded requests are never modified.
#[derive(Clone)]
pub struct BorrowRecorder {
    repo: Repository,
}

impl BorrowRecorder {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Record a pending request against an existing book.
    pub async fn borrow(&self, book_id: &str, fields: Fields) -> AppResult<BorrowRequest> {
        let book: Book = self
            .repo
            .find(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

        require_fields(&fields, REQUIRED)?;
        let form: BorrowForm = decode(fields)?;

        let request: BorrowRequest = self
            .repo
            .insert(&BorrowRecord {
                book_id: book.id,
                book_title: book.title,
                name: form.name.trim().to_string(),
                email: form.email.trim().to_string(),
                notes: form.notes.unwrap_or_default().trim().to_string(),
                status: BorrowStatus::Pending,
            })
            .await?;

        tracing::info!(request_id = %request.id, book_id = %request.book_id, "borrow request recorded");
        Ok(request)
    }

    /// All requests, newest first.
    pub async fn list_newest_first(&self) -> AppResult<Vec<BorrowRequest>> {
        let mut requests: Vec<BorrowRequest> = self.repo.list_all().await?;
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }
}
