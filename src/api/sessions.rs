//! Operator session endpoints.

use axum::{extract::State, Extension, Json};
use serde::Serialize;
use serde_json::{json, Value};

use super::{ApiResult, JsonBody};
use crate::auth::AdminIdentity;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /api/login - Exchange operator credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> ApiResult<Json<TokenResponse>> {
    let username = body.get("username").and_then(Value::as_str).unwrap_or("");
    let password = body.get("password").and_then(Value::as_str).unwrap_or("");

    let session = state.sessions.login(username, password).await?;
    Ok(Json(TokenResponse {
        token: session.token,
    }))
}

/// POST /api/logout - Revoke the presented token.
pub async fn logout(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
) -> ApiResult<Json<Value>> {
    state.sessions.logout(&identity.token).await?;
    Ok(Json(json!({ "ok": true })))
}

/// GET /api/session - Confirm the presented token is live.
pub async fn session_info(Extension(_identity): Extension<AdminIdentity>) -> Json<Value> {
    Json(json!({ "ok": true }))
}
