//! Decoding of a post's `related_links` payload.
//!
//! The backend stores related links as free text. Editors put one of three
//! things there: a JSON array of `{url, text}` objects, a JSON array of
//! plain strings, or a single non-JSON string. Decoding tries the structured
//! forms first and degrades to a one-element list holding the raw value.

use serde::{Deserialize, Serialize};

/// One entry of a post's related links.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RelatedLink {
    Link {
        url: String,
        #[serde(default)]
        text: String,
    },
    Text(String),
}

impl RelatedLink {
    pub fn href(&self) -> &str {
        match self {
            RelatedLink::Link { url, .. } => url,
            RelatedLink::Text(text) => text,
        }
    }

    /// Display text; a link without text shows its URL.
    pub fn label(&self) -> &str {
        match self {
            RelatedLink::Link { url, text } if text.is_empty() => url,
            RelatedLink::Link { text, .. } => text,
            RelatedLink::Text(text) => text,
        }
    }
}

/// Decode a raw `related_links` value. Never fails.
///
/// Absent or blank input yields no links. Input that is not a JSON array of
/// links/strings yields a single `Text` entry holding the raw value.
pub fn decode_related_links(raw: Option<&str>) -> Vec<RelatedLink> {
    let raw = match raw {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Vec::new(),
    };

    serde_json::from_str::<Vec<RelatedLink>>(raw)
        .unwrap_or_else(|_| vec![RelatedLink::Text(raw.to_string())])
}
