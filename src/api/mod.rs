//! REST API module.
//!
//! Handlers for every route under `/api`. Errors render through
//! [`AppError`](crate::errors::AppError) as `{"error": message}`.

mod authors;
mod books;
mod borrows;
mod health;
mod publishers;
mod sessions;

pub use authors::*;
pub use books::*;
pub use borrows::*;
pub use health::*;
pub use publishers::*;
pub use sessions::*;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::Deserialize;
use serde_json::Value;

use crate::db::{Fields, Pagination};
use crate::errors::AppError;

/// Response type for handlers.
pub type ApiResult<T> = Result<T, AppError>;

/// A JSON object request body.
///
/// Missing, malformed or non-object bodies read as an empty object, so the
/// handler's own validation reports what is missing.
#[derive(Debug, Default)]
pub struct JsonBody(pub Fields);

impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(format!("Unreadable request body: {}", e)))?;

        Ok(match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(fields)) => JsonBody(fields),
            _ => JsonBody::default(),
        })
    }
}

/// Query parameters accepted by list endpoints. Each endpoint reads the ones it filters on.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub city: Option<String>,
    pub author_id: Option<String>,
    pub publisher_id: Option<String>,
    pub tags: Option<String>,
}

impl ListParams {
    pub fn pagination(&self) -> Pagination {
        Pagination::from_params(self.limit.as_deref(), self.offset.as_deref())
    }
}
