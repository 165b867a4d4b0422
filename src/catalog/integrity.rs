//! Foreign-key checks for book writes.
//!
//! References are validated at write time only. Deleting an author or
//! publisher never touches the books that point at it.

use serde_json::Value;

use crate::db::{Fields, Repository};
use crate::errors::{AppError, AppResult};
use crate::models::{AUTHORS, PUBLISHERS};

/// A foreign-key field and the collection it points into.
#[derive(Debug, Clone, Copy)]
pub struct Reference {
    pub field: &'static str,
    pub collection: &'static str,
}

pub const BOOK_REFERENCES: &[Reference] = &[
    Reference {
        field: "author_id",
        collection: AUTHORS,
    },
    Reference {
        field: "publisher_id",
        collection: PUBLISHERS,
    },
];

/// Checks that reference fields resolve to existing documents.
#[derive(Clone)]
pub struct ReferenceValidator {
    repo: Repository,
    references: &'static [Reference],
}

impl ReferenceValidator {
    pub fn new(repo: Repository, references: &'static [Reference]) -> Self {
        Self { repo, references }
    }

    /// Every reference must be present in `fields` and resolve.
    pub async fn check_all(&self, fields: &Fields) -> AppResult<()> {
        for reference in self.references {
            self.check(reference, fields.get(reference.field)).await?;
        }
        Ok(())
    }

    /// Only references present in `fields` are checked.
    pub async fn check_present(&self, fields: &Fields) -> AppResult<()> {
        for reference in self.references {
            if let Some(value) = fields.get(reference.field) {
                self.check(reference, Some(value)).await?;
            }
        }
        Ok(())
    }

    async fn check(&self, reference: &Reference, value: Option<&Value>) -> AppResult<()> {
        let resolves = match value.and_then(Value::as_str).filter(|id| !id.is_empty()) {
            Some(id) => self.repo.exists(reference.collection, id).await?,
            None => false,
        };

        if resolves {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "{} does not exist",
                reference.field
            )))
        }
    }
}
