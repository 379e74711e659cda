use serde::Serialize;

use crate::model::{Category, Severity, TextSegment};

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

/// A contiguous slice of the original text, either unannotated or carrying
/// exactly one segment's annotation. Offsets are in `char`s.
///
/// Runs borrow only the text; annotation fields are copied out of the
/// segment, so the segment list may be dropped once layout returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Run<'a> {
    Plain {
        start: usize,
        end: usize,
        text: &'a str,
    },
    Annotated {
        start: usize,
        end: usize,
        text: &'a str,
        id: String,
        category: Category,
        explanation: String,
        impact: String,
        severity: Severity,
    },
}

impl<'a> Run<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            Run::Plain { text, .. } | Run::Annotated { text, .. } => *text,
        }
    }

    pub fn span(&self) -> (usize, usize) {
        match self {
            Run::Plain { start, end, .. } | Run::Annotated { start, end, .. } => (*start, *end),
        }
    }

    /// `None` for plain runs.
    pub fn category(&self) -> Option<Category> {
        match self {
            Run::Plain { .. } => None,
            Run::Annotated { category, .. } => Some(*category),
        }
    }

    pub fn segment_id(&self) -> Option<&str> {
        match self {
            Run::Plain { .. } => None,
            Run::Annotated { id, .. } => Some(id.as_str()),
        }
    }
}

/// Char-offset view over a string, so slicing never lands inside a
/// multi-byte character.
struct CharIndex<'a> {
    text: &'a str,
    /// Byte position of every char boundary, including the end of the text.
    boundaries: Vec<usize>,
}

impl<'a> CharIndex<'a> {
    fn new(text: &'a str) -> Self {
        let boundaries = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        Self { text, boundaries }
    }

    fn len(&self) -> usize {
        self.boundaries.len() - 1
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[self.boundaries[start]..self.boundaries[end]]
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lays out `segments` over `text` as an ordered sequence of non-overlapping,
/// non-empty runs.
///
/// Segments are visited by ascending `start`, then ascending `end`. Where two
/// segments share characters the one visited first keeps them and the later
/// one is cut down to what remains past the cursor. Offsets past the end of
/// the text are clamped; zero-length, inverted and fully covered segments
/// produce no run.
pub fn layout<'a>(text: &'a str, segments: &[TextSegment]) -> Vec<Run<'a>> {
    let index = CharIndex::new(text);
    let len = index.len();

    let mut order: Vec<&TextSegment> = segments.iter().collect();
    order.sort_by_key(|s| (s.start, s.end));

    let mut runs = Vec::with_capacity(order.len() * 2 + 1);
    let mut cursor = 0usize;

    for segment in order {
        let start = segment.start.min(len);
        let end = segment.end.min(len);
        if start >= end || end <= cursor {
            continue;
        }

        if start > cursor {
            runs.push(Run::Plain {
                start: cursor,
                end: start,
                text: index.slice(cursor, start),
            });
        }

        let from = start.max(cursor);
        runs.push(Run::Annotated {
            start: from,
            end,
            text: index.slice(from, end),
            id: segment.id.clone(),
            category: segment.category,
            explanation: segment.explanation.clone(),
            impact: segment.impact.clone(),
            severity: segment.severity,
        });
        cursor = end;
    }

    if cursor < len {
        runs.push(Run::Plain {
            start: cursor,
            end: len,
            text: index.slice(cursor, len),
        });
    }

    runs
}

// ---------------------------------------------------------------------------
// HTML rendering
// ---------------------------------------------------------------------------

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

/// Renders runs as an HTML fragment. Annotated runs become `<mark>` elements
/// with the category's classes, the segment id, the severity and a tooltip.
pub fn render_html(runs: &[Run<'_>]) -> String {
    let mut out = String::new();
    for run in runs {
        match run {
            Run::Plain { text, .. } => push_escaped(&mut out, text),
            Run::Annotated {
                text,
                id,
                category,
                explanation,
                impact,
                severity,
                ..
            } => {
                out.push_str("<mark class=\"");
                out.push_str(category.style().class);
                out.push_str("\" data-segment-id=\"");
                push_escaped(&mut out, id);
                out.push_str("\" data-severity=\"");
                out.push_str(severity.as_str());
                out.push_str("\" title=\"");
                push_escaped(&mut out, explanation);
                out.push_str("\n\nImpact: ");
                push_escaped(&mut out, impact);
                out.push_str("\">");
                push_escaped(&mut out, text);
                out.push_str("</mark>");
            }
        }
    }
    out
}
