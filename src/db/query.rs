//! Filtering and pagination over listed documents.

use serde::Serialize;
use serde_json::Value;

use super::store::Fields;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// A predicate over a document's fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Case-insensitive substring match on a text field.
    Contains { field: &'static str, needle: String },
    /// Exact match on a string field.
    Equals { field: &'static str, value: String },
    /// Every listed value appears in an array field.
    ContainsAll {
        field: &'static str,
        values: Vec<String>,
    },
}

impl Filter {
    /// Substring filter from a raw query parameter; blank input yields no filter.
    pub fn contains(field: &'static str, raw: Option<&str>) -> Option<Self> {
        let needle = raw?.trim().to_lowercase();
        (!needle.is_empty()).then_some(Filter::Contains { field, needle })
    }

    pub fn equals(field: &'static str, raw: Option<&str>) -> Option<Self> {
        let value = raw?.trim();
        (!value.is_empty()).then(|| Filter::Equals {
            field,
            value: value.to_string(),
        })
    }

    /// Subset filter from a comma-separated list.
    pub fn contains_all(field: &'static str, raw: Option<&str>) -> Option<Self> {
        let mut values: Vec<String> = Vec::new();
        for part in raw?.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if !values.iter().any(|v| v == part) {
                values.push(part.to_string());
            }
        }
        (!values.is_empty()).then_some(Filter::ContainsAll { field, values })
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        match self {
            Filter::Contains { field, needle } => fields
                .get(*field)
                .and_then(Value::as_str)
                .is_some_and(|text| text.to_lowercase().contains(needle.as_str())),
            Filter::Equals { field, value } => {
                fields.get(*field).and_then(Value::as_str) == Some(value.as_str())
            }
            Filter::ContainsAll { field, values } => {
                let present = fields.get(*field).and_then(Value::as_array);
                values.iter().all(|wanted| {
                    present.is_some_and(|items| items.iter().any(|i| i.as_str() == Some(wanted.as_str())))
                })
            }
        }
    }
}

/// Effective page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Pagination {
    /// Parse raw query values. Non-numeric input falls back to the defaults;
    /// limit is clamped to `[1, MAX_LIMIT]` and offset to `>= 0`.
    pub fn from_params(limit: Option<&str>, offset: Option<&str>) -> Self {
        let limit = match limit.and_then(parse_int) {
            None => DEFAULT_LIMIT,
            Some(n) if n < 1 => 1,
            Some(n) => (n as u64).min(MAX_LIMIT as u64) as usize,
        };
        let offset = offset.and_then(parse_int).map_or(0, |n| n.max(0) as usize);
        Self { limit, offset }
    }

    /// Slice `items` into a page.
    pub fn apply<T>(self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let start = self.offset.min(total);
        let end = self.offset.saturating_add(self.limit).min(total);
        let items: Vec<T> = items.into_iter().skip(start).take(end - start).collect();

        Page {
            has_more: end < total,
            items,
            total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

fn parse_int(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// One page of a filtered listing.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the filtered collection before paging.
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}
