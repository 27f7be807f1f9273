use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A token's set of category tags, parsed once from the comma-delimited form
/// the metadata feed uses.
///
/// Membership is an exact match over the parsed set: the tag "pow" does not
/// match a token tagged "power". Substring matching against the raw delimited
/// string is precisely the failure mode this type exists to rule out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    /// Parses a comma-delimited tag string, trimming whitespace and dropping
    /// empty segments.
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for TagSet {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<TagSet> for String {
    fn from(tags: TagSet) -> Self {
        tags.0.into_iter().collect::<Vec<_>>().join(",")
    }
}
