// src/pipeline/mod.rs

//! Pipeline entry points for timeline sweeps.
//!
//! - `Orchestrator::sweep_full_timeline`: phased year-by-year sweep
//! - `Orchestrator::sweep_dynasties`: Chinese dynasty pages
//! - `Orchestrator::sweep_terms`: civilization search terms
//! - `Orchestrator::sweep_key_periods`: named period pages

mod orchestrator;
pub mod validate;

pub use orchestrator::{
    CHINESE_DYNASTIES, LogProgress, Orchestrator, ProgressSink, RunOptions, SamplingPhase,
    default_civilization_terms,
};
