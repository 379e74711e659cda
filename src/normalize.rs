use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AnalyzeError;
use crate::model::{AnalysisResult, TextSegment};

// ---------------------------------------------------------------------------
// JSON extraction
// ---------------------------------------------------------------------------

/// First `{` through last `}`, greedy across newlines.
static OUTERMOST_BRACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Per-process batch counter. Every normalized result draws one value, so ids
/// generated for different results never collide either.
static NEXT_BATCH: AtomicU64 = AtomicU64::new(1);

/// Returns the region from the first `{` to the brace that closes it,
/// skipping braces inside JSON string literals.
fn balanced_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&raw[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_object(candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(value) if value.is_object() => Some(value),
        _ => None,
    }
}

/// Finds the JSON object in a provider reply that may carry prose around it.
///
/// Tries, in order: the whole trimmed string, the first-`{`-to-last-`}`
/// region, and the first brace-balanced region.
pub fn extract_json_object(raw: &str) -> Option<Value> {
    if let Some(value) = parse_object(raw.trim()) {
        return Some(value);
    }

    if let Some(m) = OUTERMOST_BRACES_RE.find(raw) {
        if let Some(value) = parse_object(m.as_str()) {
            debug!("extracted analysis object from surrounding prose");
            return Some(value);
        }
    }

    let value = balanced_object(raw).and_then(parse_object);
    if value.is_some() {
        debug!("extracted analysis object from first balanced region");
    }
    value
}

// ---------------------------------------------------------------------------
// Segment ids
// ---------------------------------------------------------------------------

/// Gives every segment a non-empty id that is unique within the slice.
///
/// Provider ids are kept on first occurrence. Missing ids, blank ids and
/// repeats of an earlier id are replaced with `segment-<batch>-<index>`.
pub fn assign_segment_ids(segments: &mut [TextSegment]) {
    let batch = NEXT_BATCH.fetch_add(1, Ordering::Relaxed);
    let reserved: HashSet<String> = segments
        .iter()
        .filter(|s| !s.id.trim().is_empty())
        .map(|s| s.id.clone())
        .collect();
    let mut used: HashSet<String> = HashSet::with_capacity(segments.len());
    let mut generated = 0usize;

    for (index, segment) in segments.iter_mut().enumerate() {
        if !segment.id.trim().is_empty() && used.insert(segment.id.clone()) {
            continue;
        }

        let mut candidate = format!("segment-{batch}-{index}");
        let mut bump = 0usize;
        while reserved.contains(&candidate) || used.contains(&candidate) {
            bump += 1;
            candidate = format!("segment-{batch}-{index}-{bump}");
        }
        used.insert(candidate.clone());
        segment.id = candidate;
        generated += 1;
    }

    if generated > 0 {
        debug!(generated, total = segments.len(), "assigned segment ids");
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Turns the provider's raw message content into a validated `AnalysisResult`.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, AnalyzeError> {
    let value = extract_json_object(raw).ok_or_else(|| {
        warn!(len = raw.len(), "provider output contains no JSON object");
        AnalyzeError::MalformedResponse("no JSON object found in provider output".to_string())
    })?;

    match value.get("segments") {
        Some(Value::Array(_)) => {}
        Some(_) => {
            return Err(AnalyzeError::MalformedResponse(
                "`segments` is not an array".to_string(),
            ))
        }
        None => {
            return Err(AnalyzeError::MalformedResponse(
                "missing `segments` field".to_string(),
            ))
        }
    }

    let mut result: AnalysisResult = serde_json::from_value(value)
        .map_err(|e| AnalyzeError::MalformedResponse(e.to_string()))?;
    result.validate().map_err(AnalyzeError::MalformedResponse)?;
    assign_segment_ids(&mut result.segments);
    Ok(result)
}
