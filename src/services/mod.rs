// src/services/mod.rs

//! External services: the Wikipedia API and the LLM extraction backend.
//!
//! Both sit behind traits so the pipeline can run against in-memory fakes
//! in tests, and so extraction can be absent entirely (degraded mode).

mod extractor;
mod wikipedia;

pub use extractor::OpenAiExtractor;
pub use wikipedia::WikipediaClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CandidateEvent, CandidatePeriod, PageContent, SearchHit, UnitKey};

/// Source of page content, keyed by work-unit.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the page for a work-unit. `Ok(None)` means the page does not
    /// exist; transport failures are errors.
    async fn fetch(&self, unit: &UnitKey) -> Result<Option<PageContent>>;

    /// Full-text search for pages matching a query.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;
}

/// Normalizes free-text page content into structured candidates.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract candidate events for a work-unit from page text.
    async fn extract_events(
        &self,
        unit: &UnitKey,
        page: &PageContent,
        region: &str,
        max_events: usize,
    ) -> Result<Vec<CandidateEvent>>;

    /// Extract a single period summary from a period page.
    async fn extract_period(
        &self,
        name: &str,
        page: &PageContent,
        region: &str,
    ) -> Result<Option<CandidatePeriod>>;
}
