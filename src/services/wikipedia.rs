// src/services/wikipedia.rs

//! Wikipedia API client.
//!
//! Talks to the MediaWiki action API (`/w/api.php`) of a single language
//! edition and returns plain-text page extracts. Year pages on the Chinese
//! edition are titled `{year}年`; BC years are `{year} BC` on the English
//! edition.

use std::collections::HashMap;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;

use crate::error::Result;
use crate::models::{PageContent, SearchHit, UnitKey};
use crate::services::PageFetcher;

/// Client for one Wikipedia language edition.
pub struct WikipediaClient {
    client: Client,
    api_url: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    query: Option<QueryBody>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: HashMap<String, RawPage>,
    #[serde(default)]
    search: Vec<RawSearchHit>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(default)]
    pageid: Option<u64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    extract: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSearchHit {
    pageid: u64,
    title: String,
}

impl WikipediaClient {
    /// Create a client for the given language edition ("en", "zh", ...).
    pub fn new(client: Client, language: &str) -> Self {
        Self {
            client,
            api_url: format!("https://{language}.wikipedia.org/w/api.php"),
            language: language.to_string(),
        }
    }

    /// Title of the page backing a work-unit.
    fn page_title(&self, unit: &UnitKey) -> String {
        match unit {
            UnitKey::Year(year) if *year < 0 => format!("{} BC", year.abs()),
            UnitKey::Year(year) if self.language == "zh" => format!("{year}年"),
            UnitKey::Year(year) => year.to_string(),
            UnitKey::Entity(name) => name.clone(),
        }
    }

    fn page_url(&self, title: &str) -> String {
        format!(
            "https://{}.wikipedia.org/wiki/{}",
            self.language,
            title.replace(' ', "_")
        )
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<ApiResponse> {
        let response = self
            .client
            .get(&self.api_url)
            .query(params)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<ApiResponse>().await?)
    }
}

#[async_trait]
impl PageFetcher for WikipediaClient {
    async fn fetch(&self, unit: &UnitKey) -> Result<Option<PageContent>> {
        let title = self.page_title(unit);
        debug!("Fetching Wikipedia page: {title}");

        let response = self
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("exsectionformat", "wiki"),
                ("titles", &title),
                ("format", "json"),
                ("origin", "*"),
            ])
            .await?;

        let pages = response.query.unwrap_or_default().pages;

        // The API keys missing pages as "-1" with no pageid.
        for (key, page) in pages {
            if key == "-1" || page.pageid.is_none() {
                continue;
            }
            let extract = match page.extract {
                Some(text) if !text.is_empty() => text,
                _ => {
                    warn!("Page {title} exists but has no extract");
                    return Ok(None);
                }
            };
            let resolved_title = page.title.unwrap_or(title);
            let source_url = self.page_url(&resolved_title);
            return Ok(Some(PageContent {
                title: resolved_title,
                extract,
                source_url: Some(source_url),
            }));
        }

        debug!("Page not found: {title}");
        Ok(None)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let limit = limit.to_string();
        let response = self
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", &limit),
                ("format", "json"),
                ("origin", "*"),
            ])
            .await?;

        let hits = response
            .query
            .unwrap_or_default()
            .search
            .into_iter()
            .map(|hit| SearchHit {
                page_id: hit.pageid,
                title: hit.title,
            })
            .collect();
        Ok(hits)
    }
}
