//! SummaryResult struct - the structured output of the summarisation service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Requested length of the generated summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    /// 2-3 sentences with the most critical insight
    Short,
    /// 4-6 sentences covering the key themes
    #[default]
    Medium,
    /// 6-8 sentences covering every major section
    Detailed,
}

impl SummaryLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryLength::Short => "short",
            SummaryLength::Medium => "medium",
            SummaryLength::Detailed => "detailed",
        }
    }
}

impl fmt::Display for SummaryLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality figures some backends report alongside the summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityMetrics {
    #[serde(default)]
    pub word_count: usize,
    #[serde(default)]
    pub sentence_count: usize,
    #[serde(default)]
    pub key_points_count: usize,
}

/// Full output of the summarisation service for one document.
///
/// Field semantics are trusted as delivered by the service. In particular
/// `summary_length <= original_length` is expected but never assumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    /// The generated summary text
    pub summary: String,
    /// Extracted highlights, in display order
    #[serde(default)]
    pub key_points: Vec<String>,
    /// Sentences in the summary
    pub sentence_count: usize,
    /// Sentences in the submitted text
    pub original_sentences: usize,
    /// Characters in the submitted text
    pub original_length: usize,
    /// Characters in the summary
    pub summary_length: usize,
    /// Number of source sections the summary touches, when the backend knows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections_covered: Option<u32>,
    /// Which summarisation strategy produced the result
    pub method: String,
    /// Length preset the backend reports having applied. Kept as text so a
    /// preset this client does not know never fails the decode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_setting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_metrics: Option<QualityMetrics>,
}

impl SummaryResult {
    /// True when the method tag names an AI backend.
    ///
    /// Informational only: nothing in the workflow branches on it.
    pub fn is_ai_generated(&self) -> bool {
        self.method.to_lowercase().contains("gemini")
    }

    /// Short label for the backend that produced this result
    pub fn engine_label(&self) -> &'static str {
        if self.is_ai_generated() {
            "Gemini AI"
        } else {
            "Rule-based"
        }
    }

    /// Check if the result carries any key points
    pub fn has_key_points(&self) -> bool {
        !self.key_points.is_empty()
    }
}
