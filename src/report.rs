use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{AnalysisResult, Category, Severity, TextPurpose, TextSegment};
use crate::style::CategoryStyle;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

struct Thresholds {
    band_excellent_min: f64,
    band_good_min: f64,
    band_fair_min: f64,
    score_to_percent: f64,
    ratio_to_percent: f64,
}

static TH: Thresholds = Thresholds {
    band_excellent_min: 8.0,
    band_good_min: 6.0,
    band_fair_min: 4.0,
    score_to_percent: 10.0,
    ratio_to_percent: 100.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    NeedsWork,
}

impl ScoreBand {
    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent",
            ScoreBand::Good => "Good",
            ScoreBand::Fair => "Fair",
            ScoreBand::NeedsWork => "Needs work",
        }
    }
}

/// Band for a 1..=10 score.
pub fn band_for_score(score: f64) -> ScoreBand {
    if score >= TH.band_excellent_min {
        ScoreBand::Excellent
    } else if score >= TH.band_good_min {
        ScoreBand::Good
    } else if score >= TH.band_fair_min {
        ScoreBand::Fair
    } else {
        ScoreBand::NeedsWork
    }
}

pub fn purpose_label(purpose: TextPurpose) -> &'static str {
    match purpose {
        TextPurpose::Narrative => "Narrative",
        TextPurpose::Argumentative => "Argumentative",
        TextPurpose::Descriptive => "Descriptive",
        TextPurpose::Informative => "Informative",
        TextPurpose::Persuasive => "Persuasive",
        TextPurpose::Unknown => "Undetermined",
    }
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
    pub style: CategoryStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityCount {
    pub severity: Severity,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub name: &'static str,
    pub value: f64,
}

/// Categories with at least one segment, in legend order.
pub fn category_counts(analysis: &AnalysisResult) -> Vec<CategoryCount> {
    Category::ALL
        .iter()
        .map(|&category| CategoryCount {
            category,
            count: analysis.count_category(category),
            style: category.style(),
        })
        .filter(|c| c.count > 0)
        .collect()
}

/// Severities with at least one segment, low to high.
pub fn severity_counts(analysis: &AnalysisResult) -> Vec<SeverityCount> {
    Severity::ALL
        .iter()
        .map(|&severity| SeverityCount {
            severity,
            count: analysis
                .segments
                .iter()
                .filter(|s| s.severity == severity)
                .count(),
        })
        .filter(|c| c.count > 0)
        .collect()
}

/// Segments bucketed by category, keeping their original order within a bucket.
pub fn group_by_category(segments: &[TextSegment]) -> BTreeMap<Category, Vec<&TextSegment>> {
    let mut groups: BTreeMap<Category, Vec<&TextSegment>> = BTreeMap::new();
    for segment in segments {
        groups.entry(segment.category).or_default().push(segment);
    }
    groups
}

/// Non-zero emotion intensities as percentages.
pub fn emotion_series(analysis: &AnalysisResult) -> Vec<SeriesPoint> {
    analysis
        .sentiment_analysis
        .emotions
        .iter()
        .filter(|(_, value)| *value > 0.0)
        .map(|(name, value)| SeriesPoint {
            name,
            value: value * TH.ratio_to_percent,
        })
        .collect()
}

/// Every headline score rescaled to 0..=100.
pub fn score_series(analysis: &AnalysisResult) -> Vec<SeriesPoint> {
    vec![
        SeriesPoint {
            name: "overall",
            value: analysis.overall_score * TH.score_to_percent,
        },
        SeriesPoint {
            name: "purpose",
            value: analysis.purpose_score * TH.score_to_percent,
        },
        SeriesPoint {
            name: "readability",
            value: analysis.readability_index.score,
        },
        SeriesPoint {
            name: "vocabulary",
            value: analysis.vocabulary_richness.richness,
        },
        SeriesPoint {
            name: "sentiment_confidence",
            value: analysis.sentiment_analysis.confidence * TH.ratio_to_percent,
        },
        SeriesPoint {
            name: "tone_confidence",
            value: analysis.tone_analysis.confidence * TH.ratio_to_percent,
        },
    ]
}

// ---------------------------------------------------------------------------
// Diagnostic report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ScoreSummary {
    pub score: f64,
    pub band: ScoreBand,
    pub label: &'static str,
}

impl ScoreSummary {
    fn new(score: f64) -> Self {
        let band = band_for_score(score);
        Self {
            score,
            band,
            label: band.label(),
        }
    }
}

/// Everything the report and chart views need, derived from one analysis.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub overall: ScoreSummary,
    pub purpose: ScoreSummary,
    pub purpose_label: &'static str,
    pub category_counts: Vec<CategoryCount>,
    pub severity_counts: Vec<SeverityCount>,
    pub emotions: Vec<SeriesPoint>,
    pub scores: Vec<SeriesPoint>,
    pub total_segments: usize,
}

pub fn build_report(analysis: &AnalysisResult) -> DiagnosticReport {
    DiagnosticReport {
        overall: ScoreSummary::new(analysis.overall_score),
        purpose: ScoreSummary::new(analysis.purpose_score),
        purpose_label: purpose_label(analysis.text_purpose),
        category_counts: category_counts(analysis),
        severity_counts: severity_counts(analysis),
        emotions: emotion_series(analysis),
        scores: score_series(analysis),
        total_segments: analysis.segments.len(),
    }
}
