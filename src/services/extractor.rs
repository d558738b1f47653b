// src/services/extractor.rs

//! LLM-backed candidate extraction.
//!
//! Sends page extracts to an OpenAI-compatible chat-completions endpoint
//! and parses the reply as JSON candidates. Models often wrap JSON in
//! Markdown code fences, so the parser strips those first and accepts a
//! bare array, an object with an `events` field, or a single object.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{CandidateEvent, CandidatePeriod, LlmConfig, PageContent, UnitKey};
use crate::services::Extractor;

// Year pages are terse; entity pages (dynasties, civilizations) run long
// and reward more context.
const YEAR_CONTEXT_CHARS: usize = 3000;
const ENTITY_CONTEXT_CHARS: usize = 5000;

/// Extractor backed by an OpenAI-compatible API.
pub struct OpenAiExtractor {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiExtractor {
    /// Build an extractor from a resolved LLM config. Fails when no API key
    /// is available; callers treat that as degraded mode rather than an
    /// error.
    pub fn new(client: Client, config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::config("llm.api_key is not set"))?;
        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    async fn chat(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a historian assistant that replies with JSON only."
                },
                { "role": "user", "content": prompt }
            ],
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AppError::extraction("chat", "response contained no choices"))?;
        Ok(content)
    }
}

#[async_trait]
impl Extractor for OpenAiExtractor {
    async fn extract_events(
        &self,
        unit: &UnitKey,
        page: &PageContent,
        region: &str,
        max_events: usize,
    ) -> Result<Vec<CandidateEvent>> {
        if page.extract.is_empty() {
            return Ok(Vec::new());
        }

        let (subject, context_chars) = match unit {
            UnitKey::Year(year) => (format!("the year {year}"), YEAR_CONTEXT_CHARS),
            UnitKey::Entity(name) => (format!("\"{name}\""), ENTITY_CONTEXT_CHARS),
        };
        let context = truncate_chars(&page.extract, context_chars);

        debug!("Extracting events for {unit} in {region}");
        let prompt = format!(
            "Extract the most significant historical events for {subject} in the \
             {region} region. Use the page content below where it helps; where the \
             content is thin, draw on well-established historical knowledge.\n\n\
             Page content:\n{context}\n\n\
             Return at most {max_events} events as a JSON array of objects with the \
             fields: event_name, start_year (integer, negative for BC), end_year, \
             key_figures, description, impact, category (political, military, \
             cultural, economic, religious, scientific), region, importance_level \
             (integer 1-10, 10 most important). Write text fields in the language \
             of the page content. Order events chronologically. Return only JSON."
        );

        let content = self.chat(&prompt).await?;
        let mut candidates = parse_event_candidates(&content)?;
        for candidate in &mut candidates {
            candidate.region.get_or_insert_with(|| region.to_string());
            if candidate.source.is_none() {
                candidate.source = page.source_url.clone();
            }
        }
        Ok(candidates)
    }

    async fn extract_period(
        &self,
        name: &str,
        page: &PageContent,
        region: &str,
    ) -> Result<Option<CandidatePeriod>> {
        if page.extract.is_empty() {
            return Ok(None);
        }
        let context = truncate_chars(&page.extract, ENTITY_CONTEXT_CHARS);

        debug!("Extracting period summary for {name} in {region}");
        let prompt = format!(
            "Summarize the historical period \"{name}\" in the {region} region \
             from the page content below.\n\n\
             Page content:\n{context}\n\n\
             Return a single JSON object with the fields: period_name, start_year \
             (integer, negative for BC), end_year, description, region, \
             era_characteristics, key_legacy. Write text fields in the language \
             of the page content. Return only JSON."
        );

        let content = self.chat(&prompt).await?;
        let stripped = strip_code_fence(&content);
        let mut candidate: CandidatePeriod = serde_json::from_str(stripped)
            .map_err(|e| AppError::extraction(name, format!("invalid period JSON: {e}")))?;
        candidate.region.get_or_insert_with(|| region.to_string());
        Ok(Some(candidate))
    }
}

/// Remove a surrounding Markdown code fence, including a `json` or
/// `python` language tag.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("python"))
        .unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Parse the model reply into candidates, accepting the shapes models
/// actually produce.
fn parse_event_candidates(content: &str) -> Result<Vec<CandidateEvent>> {
    let stripped = strip_code_fence(content);
    let value: serde_json::Value = serde_json::from_str(stripped)
        .map_err(|e| AppError::extraction("events", format!("reply is not JSON: {e}")))?;

    let candidates = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value)?,
        serde_json::Value::Object(ref map) if map.contains_key("events") => {
            serde_json::from_value(map["events"].clone())?
        }
        serde_json::Value::Object(_) => vec![serde_json::from_value(value)?],
        _ => {
            return Err(AppError::extraction(
                "events",
                "reply is neither a JSON array nor an object",
            ));
        }
    };
    Ok(candidates)
}

/// Truncate on a character boundary, not a byte offset.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
