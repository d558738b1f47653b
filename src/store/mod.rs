// src/store/mod.rs

//! Durable, queryable storage of events and periods.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. The store never deduplicates
//! on insert; callers pre-check (the pipeline's ±5-year heuristic).

mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

/// Optional filters shared by paginated event queries.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub region: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub min_importance: Option<i64>,
}

/// Partial update of an event row; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub event_name: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub key_figures: Option<String>,
    pub description: Option<String>,
    pub impact: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub importance_level: Option<i64>,
    pub source: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.event_name.is_none()
            && self.start_year.is_none()
            && self.end_year.is_none()
            && self.key_figures.is_none()
            && self.description.is_none()
            && self.impact.is_none()
            && self.category.is_none()
            && self.region.is_none()
            && self.importance_level.is_none()
            && self.source.is_none()
    }
}
