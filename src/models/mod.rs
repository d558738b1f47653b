// src/models/mod.rs

//! Domain models for the timeline application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod event;
mod page;
mod period;
mod report;

// Re-export all public types
pub use config::{Config, LlmConfig, ScrapeConfig, StorageConfig};
pub use event::{CandidateEvent, DEFAULT_IMPORTANCE, Event, NewEvent};
pub use page::{PageContent, SearchHit, UnitKey};
pub use period::{CandidatePeriod, NewPeriod, Period, PeriodType};
pub use report::{PageMeta, StoreStatistics, SweepReport};
