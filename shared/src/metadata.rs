//! Wire model for test metadata.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Metadata lookup results: test identifier to its ordered link annotations.
pub type MetadataResults = HashMap<String, Vec<Link>>;

/// A single annotation attached to a test.
///
/// Only the target URL is interpreted by this service; annotation fields
/// written by other tools are passed through as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    #[serde(rename = "URL")]
    pub url: String,

    #[serde(flatten)]
    pub extra_fields: HashMap<String, JsonValue>,
}

impl Link {
    pub fn new(url: impl Into<String>) -> Self {
        Link {
            url: url.into(),
            extra_fields: HashMap::new(),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProductSpecError {
    #[error("Invalid product spec: {0}")]
    Invalid(String),
}

/// Browser/platform combination scoping a metadata query, written as
/// `browser` or `browser-version` (e.g. `chrome`, `firefox-100`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductSpec {
    pub browser: String,
    pub version: Option<String>,
}

impl FromStr for ProductSpec {
    type Err = ProductSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (browser, version) = match s.split_once('-') {
            Some((browser, version)) => (browser, Some(version)),
            None => (s, None),
        };

        let valid_browser = !browser.is_empty()
            && browser
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if !valid_browser || version.is_some_and(|v| v.is_empty()) {
            return Err(ProductSpecError::Invalid(s.to_string()));
        }

        Ok(ProductSpec {
            browser: browser.to_string(),
            version: version.map(String::from),
        })
    }
}

impl fmt::Display for ProductSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}-{}", self.browser, version),
            None => write!(f, "{}", self.browser),
        }
    }
}

/// Collects repeated `product` parameters from a raw query string.
pub fn parse_product_params(query: Option<&str>) -> Result<Vec<ProductSpec>, ProductSpecError> {
    let Some(query) = query else {
        return Ok(Vec::new());
    };

    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(name, _)| name == "product")
        .map(|(_, value)| value.parse())
        .collect()
}
