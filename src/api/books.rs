//! Book API endpoints, including borrow requests and ratings.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use super::{ApiResult, JsonBody, ListParams};
use crate::catalog::RatingSubmission;
use crate::db::{Filter, Page};
use crate::models::{Book, BorrowRequest};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct BorrowResponse {
    pub ok: bool,
    pub request: BorrowRequest,
}

#[derive(Debug, Serialize)]
pub struct RateResponse {
    pub ok: bool,
    pub rating_avg: f64,
    pub rating_count: i64,
}

/// GET /api/books - List books.
///
/// `q` matches the title; `author_id` and `publisher_id` match exactly; `tags`
/// is a comma-separated list the book must carry all of.
pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Book>>> {
    let filters: Vec<Filter> = [
        Filter::contains("title", params.q.as_deref()),
        Filter::equals("author_id", params.author_id.as_deref()),
        Filter::equals("publisher_id", params.publisher_id.as_deref()),
        Filter::contains_all("tags", params.tags.as_deref()),
    ]
    .into_iter()
    .flatten()
    .collect();

    Ok(Json(state.repo.list(&filters, params.pagination()).await?))
}

/// GET /api/books/{id} - Get a single book.
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Book>> {
    Ok(Json(state.repo.get(&id).await?))
}

/// POST /api/books - Create a book.
pub async fn create_book(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> ApiResult<(StatusCode, Json<Book>)> {
    let book = state.books.create(body).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// PUT /api/books/{id} - Update a book.
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Json<Book>> {
    Ok(Json(state.books.update(&id, body).await?))
}

/// DELETE /api/books/{id} - Delete a book.
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.repo.delete::<Book>(&id).await?;
    tracing::info!(book_id = %id, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/books/{id}/borrow - File a borrow request.
pub async fn borrow_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<(StatusCode, Json<BorrowResponse>)> {
    let request = state.borrows.borrow(&id, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(BorrowResponse { ok: true, request }),
    ))
}

/// POST /api/books/{id}/rate - Submit a 1-5 rating.
pub async fn rate_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<(StatusCode, Json<RateResponse>)> {
    let submission = RatingSubmission::from_body(&body)?;
    let aggregate = state.ratings.rate(&id, submission).await?;

    Ok((
        StatusCode::CREATED,
        Json(RateResponse {
            ok: true,
            rating_avg: aggregate.rating_avg,
            rating_count: aggregate.rating_count,
        }),
    ))
}
