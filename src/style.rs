use serde::Serialize;

use crate::model::{Category, Severity};

/// Display descriptor for one analysis category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryStyle {
    /// CSS classes applied to highlighted runs.
    pub class: &'static str,
    pub icon: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

impl Category {
    pub fn style(self) -> CategoryStyle {
        match self {
            Category::Spelling => CategoryStyle {
                class: "hl hl-spelling",
                icon: "\u{1F534}",
                label: "Spelling errors",
                description: "Misspelled words, grammar or punctuation mistakes",
            },
            Category::Confusion => CategoryStyle {
                class: "hl hl-confusion",
                icon: "\u{1F7E0}",
                label: "Confusing ideas",
                description: "Unclear or incoherent phrasing",
            },
            Category::Repetition => CategoryStyle {
                class: "hl hl-repetition",
                icon: "\u{1F7E1}",
                label: "Repetition",
                description: "Filler words, redundancy and needless repetition",
            },
            Category::Clarity => CategoryStyle {
                class: "hl hl-clarity",
                icon: "\u{1F7E2}",
                label: "Clear ideas",
                description: "Well expressed, coherent passages",
            },
            Category::Tone => CategoryStyle {
                class: "hl hl-tone",
                icon: "\u{1F7E3}",
                label: "Notable tone",
                description: "Passages with a marked formal or informal register",
            },
            Category::Readability => CategoryStyle {
                class: "hl hl-readability",
                icon: "\u{1F535}",
                label: "Readability",
                description: "Sentences that are overly complex or overly simple",
            },
            Category::Sentiment => CategoryStyle {
                class: "hl hl-sentiment",
                icon: "\u{1F497}",
                label: "Emotional charge",
                description: "Passages carrying strong feelings",
            },
            Category::Plagiarism => CategoryStyle {
                class: "hl hl-plagiarism",
                icon: "\u{26AB}",
                label: "Common cliches",
                description: "Overused phrases and stock expressions",
            },
            Category::Vocabulary => CategoryStyle {
                class: "hl hl-vocabulary",
                icon: "\u{1F7E4}",
                label: "Vocabulary",
                description: "Sophisticated or repetitive word choice",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeverityStyle {
    pub class: &'static str,
    pub label: &'static str,
}

impl Severity {
    pub fn style(self) -> SeverityStyle {
        match self {
            Severity::Low => SeverityStyle {
                class: "sev sev-low",
                label: "Low",
            },
            Severity::Medium => SeverityStyle {
                class: "sev sev-medium",
                label: "Medium",
            },
            Severity::High => SeverityStyle {
                class: "sev sev-high",
                label: "High",
            },
        }
    }
}

/// One legend row per category, in legend order.
#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub category: Category,
    #[serde(flatten)]
    pub style: CategoryStyle,
}

pub fn legend() -> Vec<LegendEntry> {
    Category::ALL
        .iter()
        .map(|&category| LegendEntry {
            category,
            style: category.style(),
        })
        .collect()
}
