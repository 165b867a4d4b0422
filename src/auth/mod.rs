//! Bearer-token authentication for operator routes.
//!
//! Credentials and tokens are compared in constant time to mitigate timing attacks.

mod session;

pub use session::SessionAuthority;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;
use crate::AppState;

/// The authenticated operator, injected into request extensions by [`require_admin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub token: String,
}

/// Guard for privileged routes.
///
/// Rejects the request with 401 unless it carries a live bearer token. A store
/// failure during the lookup is reported as such, not as an auth rejection.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or_else(AppError::unauthorized)?;
    let identity = state.sessions.authenticate(&token).await?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
