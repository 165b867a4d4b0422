//! Borrow request listing.

use axum::{extract::State, Json};

use super::ApiResult;
use crate::models::BorrowRequest;
use crate::AppState;

/// GET /api/borrows - All borrow requests, newest first.
pub async fn list_borrows(State(state): State<AppState>) -> ApiResult<Json<Vec<BorrowRequest>>> {
    Ok(Json(state.borrows.list_newest_first().await?))
}
