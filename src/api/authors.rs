//! Author API endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::{ApiResult, JsonBody, ListParams};
use crate::db::{Filter, Page};
use crate::models::Author;
use crate::AppState;

/// GET /api/authors - List authors, optionally filtered by name.
pub async fn list_authors(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Author>>> {
    let filters: Vec<Filter> = Filter::contains("name", params.q.as_deref())
        .into_iter()
        .collect();

    Ok(Json(state.repo.list(&filters, params.pagination()).await?))
}

/// GET /api/authors/{id} - Get a single author.
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Author>> {
    Ok(Json(state.repo.get(&id).await?))
}

/// POST /api/authors - Create an author.
pub async fn create_author(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> ApiResult<(StatusCode, Json<Author>)> {
    let author: Author = state.repo.create(body).await?;
    tracing::info!(author_id = %author.id, "author created");
    Ok((StatusCode::CREATED, Json(author)))
}

/// PUT /api/authors/{id} - Update an author.
pub async fn update_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Json<Author>> {
    Ok(Json(state.repo.update(&id, body).await?))
}

/// DELETE /api/authors/{id} - Delete an author. Books referencing it are left as they are.
pub async fn delete_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.repo.delete::<Author>(&id).await?;
    tracing::info!(author_id = %id, "author deleted");
    Ok(StatusCode::NO_CONTENT)
}
