//! Controlled vocabulary for book tags.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer};

/// Tags a book may carry, in display order.
pub const TAG_OPTIONS: &[&str] = &[
    "Science Fiction",
    "Fantasy",
    "Mystery",
    "Historical",
    "Romance",
    "Non-fiction",
    "Biography",
    "Young Adult",
    "Horror",
    "Adventure",
    "Classic",
    "Thriller",
    "Humor",
    "Political",
    "Novella",
];

static VOCABULARY: Lazy<HashSet<&'static str>> = Lazy::new(|| TAG_OPTIONS.iter().copied().collect());

pub fn is_known(tag: &str) -> bool {
    VOCABULARY.contains(tag)
}

/// Trim, drop empties and unknown tags, and deduplicate keeping first occurrence.
pub fn sanitize<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cleaned: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if is_known(tag) && !cleaned.iter().any(|t| t == tag) {
            cleaned.push(tag.to_string());
        }
    }
    cleaned
}

/// Accepted wire shapes for a tag list: one tag or a sequence of tags.
#[derive(Deserialize)]
#[serde(untagged)]
enum TagInput {
    One(String),
    Many(Vec<Option<String>>),
}

/// Deserialize a raw tag list; `null` reads as empty. Sanitizing is left to the caller.
pub fn deserialize_tag_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<TagInput>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(TagInput::One(tag)) => vec![tag],
        Some(TagInput::Many(tags)) => tags.into_iter().flatten().collect(),
    })
}

/// Like [`deserialize_tag_list`] for patches: a present key always yields `Some`.
pub fn deserialize_tag_patch<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_tag_list(deserializer).map(Some)
}
