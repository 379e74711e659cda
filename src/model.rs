use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// The closed set of analysis dimensions a segment can be flagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Spelling,
    Confusion,
    Repetition,
    Clarity,
    Tone,
    Readability,
    Sentiment,
    Plagiarism,
    Vocabulary,
}

impl Category {
    /// Legend order.
    pub const ALL: [Category; 9] = [
        Category::Spelling,
        Category::Confusion,
        Category::Repetition,
        Category::Clarity,
        Category::Tone,
        Category::Readability,
        Category::Sentiment,
        Category::Plagiarism,
        Category::Vocabulary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Spelling => "spelling",
            Category::Confusion => "confusion",
            Category::Repetition => "repetition",
            Category::Clarity => "clarity",
            Category::Tone => "tone",
            Category::Readability => "readability",
            Category::Sentiment => "sentiment",
            Category::Plagiarism => "plagiarism",
            Category::Vocabulary => "vocabulary",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextPurpose {
    Narrative,
    Argumentative,
    Descriptive,
    Informative,
    Persuasive,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadabilityLevel {
    MuyFacil,
    Facil,
    Moderado,
    Dificil,
    MuyDificil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positivo,
    Neutral,
    Negativo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VocabularyLevel {
    Basico,
    Intermedio,
    Avanzado,
    Experto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formality {
    MuyInformal,
    Informal,
    Neutral,
    Formal,
    MuyFormal,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A single flagged span of the analyzed text.
///
/// `start` and `end` are half-open offsets counted in `char`s, not bytes.
/// An `id` that is absent, `null` or empty on the wire deserializes to the
/// empty string; the normalizer fills those in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSegment {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub id: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub category: Category,
    pub explanation: String,
    pub impact: String,
    pub severity: Severity,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStatistics {
    pub word_count: u64,
    pub character_count: u64,
    pub paragraph_count: u64,
    pub sentence_count: u64,
    pub average_words_per_sentence: f64,
    /// Minutes.
    pub reading_time: f64,
    pub complex_words: u64,
    pub unique_words: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityScore {
    pub score: f64,
    pub level: ReadabilityLevel,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emotions {
    pub joy: f64,
    pub sadness: f64,
    pub anger: f64,
    pub fear: f64,
    pub surprise: f64,
}

impl Emotions {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("joy", self.joy),
            ("sadness", self.sadness),
            ("anger", self.anger),
            ("fear", self.fear),
            ("surprise", self.surprise),
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub overall: SentimentLabel,
    pub confidence: f64,
    pub emotions: Emotions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyScore {
    pub richness: f64,
    pub level: VocabularyLevel,
    pub sophisticated_words: Vec<String>,
    pub repetitive_words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneScore {
    pub formality: Formality,
    pub confidence: f64,
    pub characteristics: Vec<String>,
}

/// The full critique returned by the provider, after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub segments: Vec<TextSegment>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub purpose_score: f64,
    pub purpose_analysis: String,
    pub overall_score: f64,
    pub recommendations: Vec<String>,
    pub text_purpose: TextPurpose,
    pub statistics: TextStatistics,
    pub readability_index: ReadabilityScore,
    pub sentiment_analysis: SentimentScore,
    pub vocabulary_richness: VocabularyScore,
    pub tone_analysis: ToneScore,
}

// ---------------------------------------------------------------------------
// Range checks
// ---------------------------------------------------------------------------

fn check_range(path: &str, value: f64, min: f64, max: f64) -> Result<(), String> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(format!("{path} must be within {min}..={max}, got {value}"))
    }
}

fn check_non_negative(path: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("{path} must be a non-negative number, got {value}"))
    }
}

impl AnalysisResult {
    /// Checks the numeric ranges and offset ordering that serde cannot express.
    ///
    /// Returns the path of the first offending field. Offsets are not compared
    /// against the source text; the layout engine clamps them.
    pub fn validate(&self) -> Result<(), String> {
        for (i, seg) in self.segments.iter().enumerate() {
            if seg.start > seg.end {
                return Err(format!(
                    "segments[{i}] has start {} after end {}",
                    seg.start, seg.end
                ));
            }
        }

        check_range("overallScore", self.overall_score, 1.0, 10.0)?;
        check_range("purposeScore", self.purpose_score, 1.0, 10.0)?;

        let stats = &self.statistics;
        check_non_negative(
            "statistics.averageWordsPerSentence",
            stats.average_words_per_sentence,
        )?;
        check_non_negative("statistics.readingTime", stats.reading_time)?;

        check_range("readabilityIndex.score", self.readability_index.score, 0.0, 100.0)?;

        let sentiment = &self.sentiment_analysis;
        check_range("sentimentAnalysis.confidence", sentiment.confidence, 0.0, 1.0)?;
        for (name, value) in sentiment.emotions.iter() {
            check_range(&format!("sentimentAnalysis.emotions.{name}"), value, 0.0, 1.0)?;
        }

        check_range(
            "vocabularyRichness.richness",
            self.vocabulary_richness.richness,
            0.0,
            100.0,
        )?;
        check_range("toneAnalysis.confidence", self.tone_analysis.confidence, 0.0, 1.0)?;

        Ok(())
    }

    /// Number of segments flagged with `category`.
    pub fn count_category(&self, category: Category) -> usize {
        self.segments
            .iter()
            .filter(|s| s.category == category)
            .count()
    }
}
