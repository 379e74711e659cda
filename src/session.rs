//! Per-session UI state: the primary and comparison analysis slots, saved
//! versions, and the focused segment.
//!
//! None of this is persisted. A slot lets at most one request be in flight
//! and drops results that arrive after the user has edited or cleared the
//! text they were computed for.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::AnalyzeError;
use crate::model::{AnalysisResult, Category};

// ---------------------------------------------------------------------------
// Analysis slot
// ---------------------------------------------------------------------------

/// Handed out by [`AnalysisSlot::begin`] and returned with the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    request: u64,
    generation: u64,
}

#[derive(Debug, Default)]
pub enum SlotState {
    #[default]
    Empty,
    Ready(AnalysisResult),
    Failed(String),
}

#[derive(Debug, Default)]
pub struct AnalysisSlot {
    text: String,
    state: SlotState,
    /// Bumped whenever the text or analysis is replaced by the user.
    generation: u64,
    next_request: u64,
    in_flight: Option<u64>,
}

impl AnalysisSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn state(&self) -> &SlotState {
        &self.state
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        match &self.state {
            SlotState::Ready(analysis) => Some(analysis),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SlotState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_analyzing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Replaces the text. Any shown analysis no longer matches it and is dropped.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text == self.text {
            return;
        }
        self.text = text;
        self.invalidate();
    }

    /// Empties the text and the analysis. An outstanding request keeps running
    /// but its result will be discarded.
    pub fn clear(&mut self) {
        self.text.clear();
        self.invalidate();
    }

    /// Installs a text and an already computed analysis together.
    pub fn load(&mut self, text: impl Into<String>, analysis: AnalysisResult) {
        self.text = text.into();
        self.invalidate();
        self.state = SlotState::Ready(analysis);
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.state = SlotState::Empty;
    }

    /// Starts an analysis of the current text.
    ///
    /// Fails with `EmptyInput` for blank text and `AnalysisInFlight` while a
    /// previous request is outstanding. On success the previous result is
    /// cleared and the text to submit is returned with the ticket. The text is
    /// not trimmed, so returned offsets line up with what the editor shows.
    pub fn begin(&mut self) -> Result<(Ticket, String), AnalyzeError> {
        if self.text.trim().is_empty() {
            self.state = SlotState::Failed(AnalyzeError::EmptyInput.to_string());
            return Err(AnalyzeError::EmptyInput);
        }
        if self.in_flight.is_some() {
            return Err(AnalyzeError::AnalysisInFlight);
        }

        self.next_request += 1;
        let ticket = Ticket {
            request: self.next_request,
            generation: self.generation,
        };
        self.in_flight = Some(ticket.request);
        self.state = SlotState::Empty;
        Ok((ticket, self.text.clone()))
    }

    /// Delivers the outcome of the request behind `ticket`.
    ///
    /// Always releases the in-flight flag for that request. Returns whether
    /// the outcome was applied; it is not when the text was edited or cleared
    /// after `begin`.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<AnalysisResult, AnalyzeError>,
    ) -> bool {
        if self.in_flight == Some(ticket.request) {
            self.in_flight = None;
        }
        if ticket.generation != self.generation {
            debug!(request = ticket.request, "discarding stale analysis result");
            return false;
        }
        self.state = match outcome {
            Ok(analysis) => SlotState::Ready(analysis),
            Err(e) => SlotState::Failed(e.to_string()),
        };
        true
    }
}

// ---------------------------------------------------------------------------
// Focus
// ---------------------------------------------------------------------------

/// Which highlighted segment, if any, the pointer is over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusState {
    focused: Option<String>,
}

impl FocusState {
    pub fn hover(&mut self, segment_id: &str) {
        self.focused = Some(segment_id.to_string());
    }

    pub fn leave(&mut self) {
        self.focused = None;
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn is_focused(&self, segment_id: &str) -> bool {
        self.focused.as_deref() == Some(segment_id)
    }
}

// ---------------------------------------------------------------------------
// Saved versions and comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonData {
    pub id: String,
    pub name: String,
    pub text: String,
    pub analysis: AnalysisResult,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDelta {
    pub category: Category,
    pub current: usize,
    pub other: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    /// `other - current` overall score.
    pub score_diff: f64,
    pub is_improvement: bool,
    /// `|diff / current| * 100`, zero when the current score is zero.
    pub percentage: f64,
    /// Every category, in legend order.
    pub counts: Vec<CategoryDelta>,
    /// Categories whose count differs between the two analyses.
    pub changed: Vec<Category>,
}

pub fn compare(current: &AnalysisResult, other: &AnalysisResult) -> Comparison {
    let score_diff = other.overall_score - current.overall_score;
    let percentage = if current.overall_score == 0.0 {
        0.0
    } else {
        (score_diff / current.overall_score * 100.0).abs()
    };

    let counts: Vec<CategoryDelta> = Category::ALL
        .iter()
        .map(|&category| CategoryDelta {
            category,
            current: current.count_category(category),
            other: other.count_category(category),
        })
        .collect();
    let changed = counts
        .iter()
        .filter(|d| d.current != d.other)
        .map(|d| d.category)
        .collect();

    Comparison {
        score_diff,
        is_improvement: score_diff > 0.0,
        percentage,
        counts,
        changed,
    }
}

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

/// The whole analyzer view: editor slot, comparison slot, saved versions.
#[derive(Debug, Default)]
pub struct Workspace {
    pub primary: AnalysisSlot,
    pub comparison: AnalysisSlot,
    pub focus: FocusState,
    versions: Vec<ComparisonData>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn versions(&self) -> &[ComparisonData] {
        &self.versions
    }

    /// Snapshots the primary text and analysis as "Version N".
    ///
    /// Returns `None` when the primary slot has no analysis to save.
    pub fn save_current_version(&mut self) -> Option<&ComparisonData> {
        let analysis = self.primary.analysis()?.clone();
        let timestamp = Utc::now();
        let number = self.versions.len() + 1;
        self.versions.push(ComparisonData {
            id: format!("{}-{number}", timestamp.timestamp_millis()),
            name: format!("Version {number}"),
            text: self.primary.text().to_string(),
            analysis,
            timestamp,
        });
        self.versions.last()
    }

    /// Loads a saved version into the comparison slot. Returns false for an
    /// unknown id.
    pub fn load_version(&mut self, id: &str) -> bool {
        let Some(version) = self.versions.iter().find(|v| v.id == id) else {
            return false;
        };
        self.comparison
            .load(version.text.clone(), version.analysis.clone());
        true
    }

    /// Compares the comparison slot against the primary one, when both are ready.
    pub fn comparison(&self) -> Option<Comparison> {
        Some(compare(self.primary.analysis()?, self.comparison.analysis()?))
    }

    /// Editing the primary text drops its analysis and any focus inside it.
    pub fn edit_primary(&mut self, text: impl Into<String>) {
        self.primary.set_text(text);
        if self.primary.analysis().is_none() {
            self.focus.leave();
        }
    }
}
