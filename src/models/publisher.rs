//! Publisher model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{deserialize_nullable, Editable, Resource, PUBLISHERS};

/// A publisher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publisher {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request body for creating a publisher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPublisher {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request body for updating a publisher. `"city": null` clears the city.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublisherPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub city: Option<Option<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Publisher {
    const COLLECTION: &'static str = PUBLISHERS;
}

impl Editable for Publisher {
    type Draft = NewPublisher;
    type Patch = PublisherPatch;
    const REQUIRED: &'static [&'static str] = &["name"];
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patch_distinguishes_absent_from_null_city() {
        let absent: PublisherPatch = serde_json::from_value(json!({ "name": "Tor" })).unwrap();
        assert_eq!(absent.city, None);
        assert_eq!(serde_json::to_value(&absent).unwrap(), json!({ "name": "Tor" }));

        let cleared: PublisherPatch = serde_json::from_value(json!({ "city": null })).unwrap();
        assert_eq!(cleared.city, Some(None));
        assert_eq!(serde_json::to_value(&cleared).unwrap(), json!({ "city": null }));

        let moved: PublisherPatch = serde_json::from_value(json!({ "city": "Leeds" })).unwrap();
        assert_eq!(moved.city, Some(Some("Leeds".to_string())));
        assert!(moved.extra.is_empty());
    }
}
