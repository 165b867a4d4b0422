//! Publisher API endpoints, mounted under `/api/pubs`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::{ApiResult, JsonBody, ListParams};
use crate::db::{Filter, Page};
use crate::models::Publisher;
use crate::AppState;

/// GET /api/pubs - List publishers, filtered by name (`q`) and `city` substrings.
pub async fn list_publishers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Publisher>>> {
    let filters: Vec<Filter> = [
        Filter::contains("name", params.q.as_deref()),
        Filter::contains("city", params.city.as_deref()),
    ]
    .into_iter()
    .flatten()
    .collect();

    Ok(Json(state.repo.list(&filters, params.pagination()).await?))
}

pub async fn get_publisher(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Publisher>> {
    Ok(Json(state.repo.get(&id).await?))
}

pub async fn create_publisher(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> ApiResult<(StatusCode, Json<Publisher>)> {
    let publisher: Publisher = state.repo.create(body).await?;
    tracing::info!(publisher_id = %publisher.id, "publisher created");
    Ok((StatusCode::CREATED, Json(publisher)))
}

pub async fn update_publisher(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Json<Publisher>> {
    Ok(Json(state.repo.update(&id, body).await?))
}

pub async fn delete_publisher(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.repo.delete::<Publisher>(&id).await?;
    tracing::info!(publisher_id = %id, "publisher deleted");
    Ok(StatusCode::NO_CONTENT)
}
