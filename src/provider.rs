use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ProviderConfig;
use crate::error::AnalyzeError;
use crate::model::AnalysisResult;
use crate::normalize::parse_analysis;

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// Rubric sent as the system turn. Labels and field names must match
/// `model::AnalysisResult`.
pub const SYSTEM_PROMPT: &str = r#"Eres un analizador experto de textos en español. Realiza un análisis exhaustivo y multidimensional del texto que te envíe el usuario.

1. Revisión tradicional: errores ortográficos, gramaticales y de puntuación; frases confusas o incoherentes; muletillas, repeticiones y redundancias; coherencia y claridad general.
2. Análisis avanzados: tono (formal/informal), legibilidad, sentimientos, frases cliché o muy comunes, riqueza de vocabulario.
3. Propósito: determina el propósito comunicativo (narrar, argumentar, describir, informar, persuadir) y evalúa de 1 a 10 qué tan bien lo cumple.
4. Categorías de segmento:
   - "spelling": errores ortográficos, gramaticales o de puntuación
   - "confusion": ideas confusas, incoherentes o poco claras
   - "repetition": muletillas, repeticiones o redundancias
   - "clarity": ideas bien expresadas (aspectos positivos)
   - "tone": fragmentos con un tono notable
   - "readability": oraciones demasiado complejas o demasiado simples
   - "sentiment": fragmentos con carga emocional notable
   - "plagiarism": frases cliché o muy comunes
   - "vocabulary": vocabulario sofisticado o repetitivo
5. Estadísticas: calcula métricas precisas del texto.
6. Retroalimentación: explica siempre cómo afecta cada problema al lector, incluye fortalezas y sé constructivo.

Las posiciones "start" y "end" cuentan caracteres desde 0 sobre el texto exacto recibido; "end" es exclusivo.

Responde SOLO con un objeto JSON con esta estructura exacta:
{
  "segments": [
    {
      "id": "id_unico",
      "text": "fragmento exacto",
      "start": 0,
      "end": 0,
      "type": "spelling|confusion|repetition|clarity|tone|readability|sentiment|plagiarism|vocabulary",
      "explanation": "explicación clara y educativa",
      "impact": "cómo afecta al lector",
      "severity": "low|medium|high"
    }
  ],
  "strengths": ["..."],
  "weaknesses": ["..."],
  "purposeScore": 1,
  "purposeAnalysis": "...",
  "overallScore": 1,
  "recommendations": ["..."],
  "textPurpose": "narrative|argumentative|descriptive|informative|persuasive|unknown",
  "statistics": {
    "wordCount": 0,
    "characterCount": 0,
    "paragraphCount": 0,
    "sentenceCount": 0,
    "averageWordsPerSentence": 0,
    "readingTime": 0,
    "complexWords": 0,
    "uniqueWords": 0
  },
  "readabilityIndex": {
    "score": 0,
    "level": "muy_facil|facil|moderado|dificil|muy_dificil",
    "description": "..."
  },
  "sentimentAnalysis": {
    "overall": "positivo|neutral|negativo",
    "confidence": 0,
    "emotions": { "joy": 0, "sadness": 0, "anger": 0, "fear": 0, "surprise": 0 }
  },
  "vocabularyRichness": {
    "richness": 0,
    "level": "basico|intermedio|avanzado|experto",
    "sophisticatedWords": ["..."],
    "repetitiveWords": ["..."]
  },
  "toneAnalysis": {
    "formality": "muy_informal|informal|neutral|formal|muy_formal",
    "confidence": 0,
    "characteristics": ["..."]
  }
}"#;

pub fn user_prompt(text: &str) -> String {
    format!("Analiza este texto:\n\n\"{text}\"")
}

// ---------------------------------------------------------------------------
// Chat-completions wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatReply,
}

#[derive(Debug, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Content of the first choice.
    pub fn into_content(self) -> Result<String, AnalyzeError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                AnalyzeError::MalformedResponse("provider returned no message content".to_string())
            })
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Anything that turns a text into the provider's raw reply.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn complete(&self, text: &str) -> Result<String, AnalyzeError>;
}

/// OpenAI-compatible chat-completions endpoint.
pub struct HttpProvider {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl HttpProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, AnalyzeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AnalyzeError::ProviderUnavailable(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[async_trait]
impl AnalysisProvider for HttpProvider {
    async fn complete(&self, text: &str) -> Result<String, AnalyzeError> {
        let user = user_prompt(text);
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let started = Instant::now();
        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await.map_err(|e| {
            warn!("provider request failed: {e}");
            AnalyzeError::ProviderUnavailable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(%status, elapsed_ms = started.elapsed().as_millis() as u64, "provider returned an error: {detail}");
            return Err(AnalyzeError::ProviderUnavailable(format!(
                "provider returned {status}"
            )));
        }

        let envelope: ChatResponse = response.json().await.map_err(|e| {
            AnalyzeError::MalformedResponse(format!("chat completion envelope: {e}"))
        })?;
        info!(
            %status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            model = %self.config.model,
            "provider replied"
        );
        envelope.into_content()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// One full analyze cycle: reject blank input, ask the provider, normalize.
pub async fn analyze_text(
    provider: &dyn AnalysisProvider,
    text: &str,
) -> Result<AnalysisResult, AnalyzeError> {
    if text.trim().is_empty() {
        return Err(AnalyzeError::EmptyInput);
    }
    let raw = provider.complete(text).await?;
    parse_analysis(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_comes_from_first_choice() {
        let envelope: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"{}"}},{"message":{"content":"x"}}]}"#,
        )
        .unwrap();
        assert_eq!(envelope.into_content().unwrap(), "{}");
    }

    #[test]
    fn missing_or_blank_content_is_malformed() {
        for raw in [
            r#"{}"#,
            r#"{"choices":[]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
            r#"{"choices":[{"message":{"content":"  "}}]}"#,
        ] {
            let envelope: ChatResponse = serde_json::from_str(raw).unwrap();
            assert!(
                matches!(envelope.into_content(), Err(AnalyzeError::MalformedResponse(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn request_carries_rubric_and_quoted_text() {
        let user = user_prompt("Hola");
        let body = ChatRequest {
            model: "m",
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: &user },
            ],
            temperature: 0.3,
            max_tokens: 4000,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "Analiza este texto:\n\n\"Hola\"");
        assert_eq!(value["max_tokens"], 4000);
    }
}
