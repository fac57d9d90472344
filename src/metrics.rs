//! Derived statistics for input text, summary results and notes.
//!
//! Everything here is a pure function of its arguments. Callers recompute on
//! every read so the figures can never drift from the text they describe.

use crate::summary::SummaryResult;
use serde::Serialize;
use std::fmt;

/// Average reading speed used for the reading time estimate
pub const WORDS_PER_MINUTE: usize = 200;

/// Below this many characters the input is flagged as too short
pub const GOOD_LENGTH_CHARS: usize = 100;

/// From this many characters on the input is considered ideal
pub const EXCELLENT_LENGTH_CHARS: usize = 500;

/// Number of characters (Unicode scalar values), the same unit the service
/// uses for `original_length` and `summary_length`.
pub fn character_count(text: &str) -> usize {
    text.chars().count()
}

/// Number of whitespace-delimited tokens; zero for blank text.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Whole minutes needed to read `words` words, rounded up.
pub fn reading_time_minutes(words: usize) -> usize {
    words.div_ceil(WORDS_PER_MINUTE)
}

/// How the host should present a quality hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Info,
    Positive,
}

/// Content-quality classification of the input length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    NeedsMoreText,
    GoodLength,
    ExcellentLength,
}

impl QualityTier {
    /// Classify by character count. Boundaries belong to the higher tier.
    pub fn for_length(characters: usize) -> Self {
        if characters < GOOD_LENGTH_CHARS {
            QualityTier::NeedsMoreText
        } else if characters < EXCELLENT_LENGTH_CHARS {
            QualityTier::GoodLength
        } else {
            QualityTier::ExcellentLength
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            QualityTier::NeedsMoreText => Severity::Warning,
            QualityTier::GoodLength => Severity::Info,
            QualityTier::ExcellentLength => Severity::Positive,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            QualityTier::NeedsMoreText => {
                "Add more text for better summaries (100+ characters recommended)"
            }
            QualityTier::GoodLength => "Good length! Ready for summarisation",
            QualityTier::ExcellentLength => {
                "Perfect! This length will generate an excellent summary"
            }
        }
    }
}

/// Statistics shown while the user is preparing input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputStats {
    pub character_count: usize,
    pub word_count: usize,
    pub reading_time_minutes: usize,
    pub quality: QualityTier,
}

impl InputStats {
    pub fn of(content: &str) -> Self {
        let character_count = character_count(content);
        let word_count = word_count(content);
        Self {
            character_count,
            word_count,
            reading_time_minutes: reading_time_minutes(word_count),
            quality: QualityTier::for_length(character_count),
        }
    }
}

/// Relative size reduction from original to summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    /// Rounded percentage; negative when the summary is longer than the source
    Percent(i64),
    /// The original length was zero, so no ratio exists
    NotAvailable,
}

impl Compression {
    pub fn compute(original_length: usize, summary_length: usize) -> Self {
        if original_length == 0 {
            return Compression::NotAvailable;
        }
        let ratio = summary_length as f64 / original_length as f64;
        Compression::Percent(((1.0 - ratio) * 100.0).round() as i64)
    }

    pub fn percent(&self) -> Option<i64> {
        match self {
            Compression::Percent(p) => Some(*p),
            Compression::NotAvailable => None,
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::Percent(p) => write!(f, "{}%", p),
            Compression::NotAvailable => f.write_str("N/A"),
        }
    }
}

/// Placeholder-aware rendering of an optional count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OptionalCount(pub Option<u32>);

impl fmt::Display for OptionalCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(n) => write!(f, "{}", n),
            None => f.write_str("N/A"),
        }
    }
}

/// Statistics shown next to a summary result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResultStats {
    pub compression: Compression,
    pub sentence_count: usize,
    pub key_point_count: usize,
    pub sections_covered: OptionalCount,
    pub original_sentences: usize,
    pub original_length: usize,
    pub summary_length: usize,
}

impl ResultStats {
    pub fn of(result: &SummaryResult) -> Self {
        Self {
            compression: Compression::compute(result.original_length, result.summary_length),
            sentence_count: result.sentence_count,
            key_point_count: result.key_points.len(),
            sections_covered: OptionalCount(result.sections_covered),
            original_sentences: result.original_sentences,
            original_length: result.original_length,
            summary_length: result.summary_length,
        }
    }
}

/// Live counters for the user's notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NotesStats {
    pub word_count: usize,
    pub character_count: usize,
}

impl NotesStats {
    pub fn of(notes: &str) -> Self {
        Self {
            word_count: word_count(notes),
            character_count: character_count(notes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_handles_blank_and_mixed_whitespace() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \n\t "), 0);
        assert_eq!(word_count("one"), 1);
        assert_eq!(word_count("  one\ttwo\n\nthree  "), 3);
    }

    #[test]
    fn reading_time_rounds_up_to_whole_minutes() {
        assert_eq!(reading_time_minutes(0), 0);
        assert_eq!(reading_time_minutes(1), 1);
        assert_eq!(reading_time_minutes(200), 1);
        assert_eq!(reading_time_minutes(201), 2);
    }

    #[test]
    fn non_empty_text_has_at_least_one_word() {
        for text in ["a", "Hello world", " x ", "émigré café"] {
            let stats = InputStats::of(text);
            assert!(stats.word_count >= 1, "{text:?}");
            assert_eq!(
                stats.reading_time_minutes,
                stats.word_count.div_ceil(WORDS_PER_MINUTE)
            );
        }
    }

    #[test]
    fn quality_tier_boundaries_fall_into_higher_tier() {
        assert_eq!(QualityTier::for_length(0), QualityTier::NeedsMoreText);
        assert_eq!(QualityTier::for_length(99), QualityTier::NeedsMoreText);
        assert_eq!(QualityTier::for_length(100), QualityTier::GoodLength);
        assert_eq!(QualityTier::for_length(499), QualityTier::GoodLength);
        assert_eq!(QualityTier::for_length(500), QualityTier::ExcellentLength);
        assert_eq!(QualityTier::for_length(99).severity(), Severity::Warning);
        assert_eq!(QualityTier::for_length(500).severity(), Severity::Positive);
    }

    #[test]
    fn characters_are_counted_not_bytes() {
        let stats = InputStats::of("naïve");
        assert_eq!(stats.character_count, 5);
    }

    #[test]
    fn compression_matches_reference_values() {
        assert_eq!(Compression::compute(200, 50), Compression::Percent(75));
        assert_eq!(Compression::compute(11, 6), Compression::Percent(45));
        assert_eq!(Compression::compute(100, 100), Compression::Percent(0));
    }

    #[test]
    fn compression_of_empty_original_falls_back() {
        let c = Compression::compute(0, 0);
        assert_eq!(c, Compression::NotAvailable);
        assert_eq!(c.percent(), None);
        assert_eq!(c.to_string(), "N/A");
        assert_eq!(Compression::compute(0, 12).to_string(), "N/A");
    }

    #[test]
    fn inverted_ratio_is_reported_as_negative() {
        assert_eq!(Compression::compute(50, 100), Compression::Percent(-100));
        assert_eq!(Compression::compute(50, 100).to_string(), "-100%");
    }

    #[test]
    fn sections_covered_distinguishes_absent_from_zero() {
        assert_eq!(OptionalCount(None).to_string(), "N/A");
        assert_eq!(OptionalCount(Some(0)).to_string(), "0");
        assert_eq!(OptionalCount(Some(3)).to_string(), "3");
    }

    #[test]
    fn notes_stats_follow_the_same_tokenisation() {
        assert_eq!(NotesStats::of(""), NotesStats::default());
        let stats = NotesStats::of("Follow up  with\nthe team");
        assert_eq!(stats.word_count, 5);
        assert_eq!(stats.character_count, 24);
    }
}
