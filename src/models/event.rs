// src/models/event.rs

//! Historical event data structures.
//!
//! Three shapes of the same record: [`CandidateEvent`] is the loosely-typed
//! extractor output (nothing guaranteed present), [`NewEvent`] has passed
//! validation and is ready for insertion, [`Event`] is a stored row with its
//! surrogate id.

use serde::{Deserialize, Serialize};

/// Importance assigned when a candidate carries none.
pub const DEFAULT_IMPORTANCE: i64 = 5;

/// An unvalidated event candidate as produced by the extractor.
///
/// Every field is optional: model output need not be pre-validated, the
/// pipeline validates before persisting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CandidateEvent {
    /// Event name
    #[serde(default)]
    pub event_name: Option<String>,

    /// Start year (negative = BCE)
    #[serde(default)]
    pub start_year: Option<i64>,

    /// End year, absent for point events
    #[serde(default)]
    pub end_year: Option<i64>,

    /// Comma-separated key figures
    #[serde(default)]
    pub key_figures: Option<String>,

    /// Short summary
    #[serde(default)]
    pub description: Option<String>,

    /// Historical impact
    #[serde(default)]
    pub impact: Option<String>,

    /// Category (political, military, cultural, ...)
    #[serde(default)]
    pub category: Option<String>,

    /// Region name (e.g. "European", "Chinese")
    #[serde(default)]
    pub region: Option<String>,

    /// Importance level 1-10
    #[serde(default)]
    pub importance_level: Option<i64>,

    /// Source URI
    #[serde(default)]
    pub source: Option<String>,
}

/// A validated event ready for insertion into the record store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewEvent {
    pub event_name: String,
    pub start_year: i32,
    pub end_year: Option<i32>,
    pub key_figures: Option<String>,
    pub description: Option<String>,
    pub impact: Option<String>,
    pub category: Option<String>,
    pub region: String,
    pub importance_level: i64,
    pub source: Option<String>,
}

/// A stored event row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Surrogate id assigned by the store
    pub id: i64,

    #[serde(flatten)]
    pub record: NewEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_deserializes_with_missing_fields() {
        let candidate: CandidateEvent =
            serde_json::from_str(r#"{"event_name": "Battle of Hastings"}"#).unwrap();
        assert_eq!(candidate.event_name.as_deref(), Some("Battle of Hastings"));
        assert!(candidate.start_year.is_none());
        assert!(candidate.importance_level.is_none());
    }

    #[test]
    fn test_candidate_roundtrip() {
        let candidate = CandidateEvent {
            event_name: Some("Fall of Constantinople".to_string()),
            start_year: Some(1453),
            importance_level: Some(9),
            region: Some("European".to_string()),
            ..CandidateEvent::default()
        };
        let json = serde_json::to_string(&candidate).unwrap();
        let back: CandidateEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, candidate);
    }
}
