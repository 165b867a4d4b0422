//! Operator session tokens.
//!
//! Live tokens are held in an in-process cache backed by the `admin_sessions`
//! collection, so sessions survive a restart. A token absent from the cache is
//! looked up in the store and cached again when found.

use std::collections::HashSet;
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use tokio::sync::RwLock;

use super::{constant_time_compare, AdminIdentity};
use crate::db::{DocumentStore, Fields};
use crate::errors::{AppError, AppResult};
use crate::models::{AdminSession, Resource, ADMIN_SESSIONS};

const TOKEN_BYTES: usize = 32;

/// Issues, validates and revokes bearer tokens for the single operator account.
pub struct SessionAuthority {
    username: String,
    password: String,
    store: Arc<dyn DocumentStore>,
    cache: RwLock<HashSet<String>>,
}

impl SessionAuthority {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            store,
            cache: RwLock::new(HashSet::new()),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<AdminSession> {
        // Evaluate both comparisons before branching
        let user_ok = constant_time_compare(username.trim(), &self.username);
        let pass_ok = constant_time_compare(password, &self.password);
        if !(user_ok && pass_ok) {
            tracing::warn!("rejected operator login");
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        let token = mint_token();
        let doc = self.store.insert(ADMIN_SESSIONS, &token, Fields::new()).await?;
        self.cache.write().await.insert(token);

        let session = AdminSession::from_document(doc)?;
        tracing::info!(created_at = %session.created_at, "operator session issued");
        Ok(session)
    }

    pub async fn authenticate(&self, token: &str) -> AppResult<AdminIdentity> {
        if self.cache.read().await.contains(token) {
            return Ok(AdminIdentity {
                token: token.to_string(),
            });
        }

        // The write lock spans the store lookup so a concurrent logout cannot
        // land between the lookup and the refill.
        let mut cache = self.cache.write().await;
        if !cache.contains(token) {
            if self.store.get(ADMIN_SESSIONS, token).await?.is_none() {
                return Err(AppError::unauthorized());
            }
            cache.insert(token.to_string());
            tracing::debug!("operator session restored from store");
        }

        Ok(AdminIdentity {
            token: token.to_string(),
        })
    }

    /// Revoke a token. Revoking an unknown token is not an error.
    pub async fn logout(&self, token: &str) -> AppResult<()> {
        let mut cache = self.cache.write().await;
        cache.remove(token);
        if self.store.delete(ADMIN_SESSIONS, token).await? {
            tracing::info!("operator session revoked");
        }
        Ok(())
    }
}

fn mint_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
