//! In-process Gemini backend for the summarisation gateway.
//!
//! Uses rstructor to talk to Gemini and derives the same result fields the
//! summarisation service reports, so either backend can sit behind the
//! workflow.

use crate::config::Config;
use crate::document::Document;
use crate::gateway::{Failure, Summarizer};
use crate::metrics::{character_count, word_count};
use crate::summary::{QualityMetrics, SummaryLength, SummaryResult};
use async_trait::async_trait;
use rstructor::{GeminiClient, GeminiModel, LLMClient};
use schemars::JsonSchema;
use serde::Deserialize;
use thiserror::Error;

/// Method tag reported with every Gemini result
pub const GEMINI_METHOD: &str = "gemini-ai-pure";

/// Texts shorter than this are not worth summarising
pub const MIN_TEXT_CHARS: usize = 50;

const MAX_KEY_POINTS: usize = 4;
const MAX_KEY_POINT_CHARS: usize = 70;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Text too short to summarize (minimum 50 characters)")]
    TextTooShort,
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("failed to parse response: {0}")]
    ParseError(String),
    #[error("configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),
}

impl From<AgentError> for Failure {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::TextTooShort | AgentError::ConfigError(_) => Failure::new(err.to_string(), false),
            AgentError::ParseError(_) => {
                Failure::new("Failed to parse AI response. Please try again.", true)
            }
            AgentError::RequestFailed(msg) => {
                Failure::new(format!("AI summarization failed: {}", msg), true)
            }
        }
    }
}

/// Shape the model is asked to answer with
#[derive(Debug, Clone, Deserialize, JsonSchema)]
struct Draft {
    /// The flowing summary text
    main_summary: String,
    /// Short standalone insights, each under 70 characters
    #[serde(default)]
    key_points: Option<Vec<String>>,
}

/// Summariser that calls Gemini directly
#[derive(Debug, Clone)]
pub struct GeminiSummarizer {
    api_key: String,
    model: String,
    persona: String,
    length: SummaryLength,
}

impl GeminiSummarizer {
    pub fn from_config(config: &Config) -> Result<Self, AgentError> {
        Ok(Self {
            api_key: config.api_key()?.to_string(),
            model: config.agent.model.clone(),
            persona: config.agent.persona.clone(),
            length: config.service.length,
        })
    }

    /// Run the model on the provided text
    pub async fn summarize(&self, text: &str) -> Result<SummaryResult, AgentError> {
        let text = text.trim();
        if character_count(text) < MIN_TEXT_CHARS {
            return Err(AgentError::TextTooShort);
        }

        let client = GeminiClient::new(self.api_key.as_str())
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?
            .model(parse_gemini_model(&self.model));

        let prompt = build_prompt(&self.persona, self.length, text)?;
        tracing::info!(model = %self.model, length = %self.length, "requesting summary from Gemini");

        let result = client
            .generate_with_metadata(&prompt)
            .await
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?;
        tracing::debug!(characters = result.text.len(), "Gemini response received");

        let cleaned = strip_markdown_json(&result.text);
        let draft: Draft = serde_json::from_str(&cleaned)
            .map_err(|e| AgentError::ParseError(format!("{}: {}", e, cleaned)))?;

        Ok(build_result(text, draft, self.length))
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn submit(&self, document: &Document) -> Result<SummaryResult, Failure> {
        self.summarize(document.content()).await.map_err(|e| {
            tracing::warn!(error = %e, "Gemini summarisation failed");
            Failure::from(e)
        })
    }
}

fn build_prompt(persona: &str, length: SummaryLength, text: &str) -> Result<String, AgentError> {
    let (sentences, focus, style) = match length {
        SummaryLength::Short => (
            "2-3 sentences",
            "the absolute most critical insights and main conclusion",
            "concise and impactful",
        ),
        SummaryLength::Medium => (
            "4-6 sentences",
            "key themes, main applications, and important implications",
            "balanced and comprehensive",
        ),
        SummaryLength::Detailed => (
            "6-8 sentences",
            "all major sections, applications, benefits, concerns, and future outlook",
            "thorough and well-structured",
        ),
    };
    let schema = serde_json::to_string_pretty(&schemars::schema_for!(Draft))
        .map_err(|e| AgentError::ParseError(e.to_string()))?;

    Ok(format!(
        r#"{persona}

Create exactly {sentences} that capture {focus}.
Style: {style}. Cover all major sections of the text in balance, keep the
original tone and conclusions, and mention both opportunities and challenges.
Return at most {MAX_KEY_POINTS} key points, each under {MAX_KEY_POINT_CHARS} characters.

You MUST respond with valid JSON matching this schema:
{schema}

Do not include any markdown formatting, code blocks, or explanations. Only output the raw JSON object.

---

{text}"#
    ))
}

/// Number of non-blank `.`-separated fragments
fn sentence_count(text: &str) -> usize {
    text.split('.').filter(|s| !s.trim().is_empty()).count()
}

fn truncate_chars(text: &str, keep: usize) -> String {
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Key points taken from the summary when the model returned none
fn fallback_key_points(summary: &str) -> Vec<String> {
    summary
        .split(". ")
        .take(MAX_KEY_POINTS)
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            if character_count(s) > 68 {
                truncate_chars(s, 65)
            } else {
                s.to_string()
            }
        })
        .collect()
}

/// Trim, shorten and de-duplicate key points, keeping at most four
fn clean_key_points(points: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for point in points.into_iter().take(MAX_KEY_POINTS) {
        let mut point = point.trim().trim_end_matches('.').to_string();
        if character_count(&point) > MAX_KEY_POINT_CHARS {
            point = truncate_chars(&point, MAX_KEY_POINT_CHARS - 3);
        }
        if !point.is_empty() && !cleaned.contains(&point) {
            cleaned.push(point);
        }
    }
    cleaned
}

fn build_result(text: &str, draft: Draft, length: SummaryLength) -> SummaryResult {
    let summary = draft.main_summary.trim().to_string();
    let key_points = clean_key_points(
        draft
            .key_points
            .unwrap_or_else(|| fallback_key_points(&summary)),
    );
    let sentences = sentence_count(&summary);

    SummaryResult {
        quality_metrics: Some(QualityMetrics {
            word_count: word_count(&summary),
            sentence_count: sentences,
            key_points_count: key_points.len(),
        }),
        sentence_count: sentences,
        original_sentences: sentence_count(text),
        original_length: character_count(text),
        summary_length: character_count(&summary),
        sections_covered: None,
        method: GEMINI_METHOD.to_string(),
        length_setting: Some(length.to_string()),
        summary,
        key_points,
    }
}

/// Strip markdown code block wrappers from JSON response
fn strip_markdown_json(text: &str) -> String {
    let trimmed = text.trim();

    if let Some(rest) = trimmed.strip_prefix("```") {
        let without_prefix = rest.strip_prefix("json").unwrap_or(rest);
        if let Some(end_idx) = without_prefix.rfind("```") {
            return without_prefix[..end_idx].trim().to_string();
        }
    }

    // Fall back to the outermost braces when the model added prose
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return trimmed[start..=end].to_string();
        }
    }

    trimmed.to_string()
}

/// Parse a model string into a GeminiModel
fn parse_gemini_model(model: &str) -> GeminiModel {
    match model {
        "gemini-2.0-flash" => GeminiModel::Gemini20Flash,
        "gemini-2.5-flash" => GeminiModel::Gemini25Flash,
        "gemini-2.5-pro" => GeminiModel::Gemini25Pro,
        _ => GeminiModel::Gemini20Flash, // Default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(summary: &str, points: Option<Vec<&str>>) -> Draft {
        Draft {
            main_summary: summary.to_string(),
            key_points: points.map(|p| p.into_iter().map(String::from).collect()),
        }
    }

    #[test]
    fn strips_code_fences_and_prose() {
        assert_eq!(strip_markdown_json("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_markdown_json("```\n{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_markdown_json("Here you go: {\"a\":1} done"), "{\"a\":1}");
    }

    #[test]
    fn key_points_are_cleaned_and_capped() {
        let long = "x".repeat(80);
        let points = clean_key_points(
            vec!["  First.", "First", "", long.as_str(), "Third", "Fourth"]
                .into_iter()
                .map(String::from)
                .collect(),
        );
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], "First");
        assert_eq!(points[1].chars().count(), MAX_KEY_POINT_CHARS);
        assert!(points[1].ends_with("..."));
    }

    #[test]
    fn missing_key_points_come_from_the_summary() {
        let result = build_result(
            "Some long original text. It has sentences. Three of them.",
            draft("Alpha is first. Beta follows. Gamma ends.", None),
            SummaryLength::Short,
        );
        assert_eq!(result.key_points, vec!["Alpha is first", "Beta follows", "Gamma ends"]);
    }

    #[test]
    fn derived_counts_match_the_texts() {
        let text = "One sentence here. Another one there. And a third!";
        let result = build_result(text, draft(" Short. Summary. ", Some(vec!["Point"])), SummaryLength::Medium);
        assert_eq!(result.summary, "Short. Summary.");
        assert_eq!(result.sentence_count, 2);
        assert_eq!(result.original_sentences, 3);
        assert_eq!(result.original_length, text.chars().count());
        assert_eq!(result.summary_length, 15);
        assert_eq!(result.method, GEMINI_METHOD);
        assert_eq!(result.length_setting.as_deref(), Some("medium"));
        assert_eq!(result.quality_metrics.as_ref().unwrap().word_count, 2);
        assert!(result.is_ai_generated());
    }

    #[test]
    fn short_text_failure_is_not_retryable() {
        let failure = Failure::from(AgentError::TextTooShort);
        assert!(!failure.retryable);
        assert!(failure.message.contains("minimum 50"));
    }

    #[test]
    fn prompt_embeds_schema_and_length() {
        let prompt = build_prompt("You are precise.", SummaryLength::Detailed, "body").unwrap();
        assert!(prompt.starts_with("You are precise."));
        assert!(prompt.contains("6-8 sentences"));
        assert!(prompt.contains("main_summary"));
        assert!(prompt.ends_with("body"));
    }
}
