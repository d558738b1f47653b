// src/models/page.rs

//! Work-unit keys and fetched page content.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one work-unit within a region: either a sampled year or a
/// named entity (dynasty, civilization, search term).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKey {
    Year(i32),
    Entity(String),
}

impl UnitKey {
    /// Stable key segment used in cache file names.
    ///
    /// Path separators are replaced so entity names can never escape the
    /// region directory.
    pub fn cache_key(&self) -> String {
        match self {
            UnitKey::Year(year) => year.to_string(),
            UnitKey::Entity(name) => name.replace(['/', '\\'], "_"),
        }
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKey::Year(year) => write!(f, "{year}"),
            UnitKey::Entity(name) => f.write_str(name),
        }
    }
}

/// Raw page content returned by the fetcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PageContent {
    /// Page title
    pub title: String,

    /// Plain-text extract of the page body
    pub extract: String,

    /// Canonical URL of the page
    #[serde(default)]
    pub source_url: Option<String>,
}

/// One result of a fetcher search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub page_id: u64,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_for_years() {
        assert_eq!(UnitKey::Year(1492).cache_key(), "1492");
        assert_eq!(UnitKey::Year(-55).cache_key(), "-55");
    }

    #[test]
    fn test_cache_key_sanitizes_entity_names() {
        assert_eq!(UnitKey::Entity("唐朝".to_string()).cache_key(), "唐朝");
        assert_eq!(
            UnitKey::Entity("a/b\\c".to_string()).cache_key(),
            "a_b_c"
        );
    }
}
