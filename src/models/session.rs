//! Operator session model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Resource, ADMIN_SESSIONS};

/// A live operator session. The document id is the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSession {
    #[serde(rename = "id")]
    pub token: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Resource for AdminSession {
    const COLLECTION: &'static str = ADMIN_SESSIONS;
}
