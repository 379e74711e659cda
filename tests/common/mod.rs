#![allow(dead_code)]

use serde_json::{json, Value};
use text_critic::{Category, Severity, TextSegment};

/// A complete, valid provider payload with the given segments.
pub fn analysis_json(segments: Value) -> Value {
    json!({
        "segments": segments,
        "strengths": ["Ideas bien ordenadas"],
        "weaknesses": ["Errores ortográficos"],
        "purposeScore": 7,
        "purposeAnalysis": "Cumple su función informativa.",
        "overallScore": 6.5,
        "recommendations": ["Revisar la ortografía"],
        "textPurpose": "informative",
        "statistics": {
            "wordCount": 6,
            "characterCount": 27,
            "paragraphCount": 1,
            "sentenceCount": 2,
            "averageWordsPerSentence": 3.0,
            "readingTime": 0.1,
            "complexWords": 0,
            "uniqueWords": 6
        },
        "readabilityIndex": {
            "score": 82,
            "level": "facil",
            "description": "Fácil de leer"
        },
        "sentimentAnalysis": {
            "overall": "neutral",
            "confidence": 0.8,
            "emotions": { "joy": 0.2, "sadness": 0.0, "anger": 0.0, "fear": 0.0, "surprise": 0.1 }
        },
        "vocabularyRichness": {
            "richness": 40,
            "level": "basico",
            "sophisticatedWords": [],
            "repetitiveWords": ["es"]
        },
        "toneAnalysis": {
            "formality": "neutral",
            "confidence": 0.7,
            "characteristics": ["directo"]
        }
    })
}

pub fn segment_json(id: Option<&str>, start: usize, end: usize, category: &str) -> Value {
    let mut seg = json!({
        "text": "",
        "start": start,
        "end": end,
        "type": category,
        "explanation": format!("{category} at {start}"),
        "impact": "distracts the reader",
        "severity": "medium"
    });
    if let Some(id) = id {
        seg["id"] = json!(id);
    }
    seg
}

pub fn segment(id: &str, start: usize, end: usize, category: Category) -> TextSegment {
    TextSegment {
        id: id.to_string(),
        text: String::new(),
        start,
        end,
        category,
        explanation: format!("{category} at {start}"),
        impact: "distracts the reader".to_string(),
        severity: Severity::Medium,
    }
}
