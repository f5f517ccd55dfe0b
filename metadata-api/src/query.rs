use serde::Deserialize;

/// Structured search query accepted by metadata POST requests.
///
/// Mirrors the dashboard's search grammar: a root `exists` clause wrapping a
/// list of predicates. The metadata route only serves queries that are exactly
/// one link predicate; everything else is rejected by the caller.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExistsQuery {
    pub exists: Vec<QueryNode>,
}

/// A single search predicate.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum QueryNode {
    /// Substring match against annotation URLs.
    Link(String),
    /// Regex match against test names. Recognized so such queries parse, but
    /// not answerable from metadata alone.
    Pattern(String),
}

impl ExistsQuery {
    /// Returns the sole link pattern if this query is exactly one link
    /// predicate, `None` otherwise.
    pub fn link_pattern(&self) -> Option<&str> {
        match self.exists.as_slice() {
            [QueryNode::Link(pattern)] => Some(pattern),
            _ => None,
        }
    }
}
