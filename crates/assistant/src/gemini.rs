// Google Gemini transport (generateContent / streamGenerateContent)

use std::io::BufReader;

use serde::{Deserialize, Serialize};

use crate::error::{classify_status, ServiceError};
use crate::http;
use crate::service::{ChatMessage, ChatTransport, Role};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

// ============================================================================
// Gemini API types
// ============================================================================

#[derive(Serialize)]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    message: String,
    status: Option<String>,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate. `None` when the chunk
    /// carries no text (e.g. a trailing finish-reason chunk).
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn empty_reason(&self) -> String {
        if let Some(reason) = self.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_deref()) {
            return format!("prompt blocked ({reason})");
        }
        match self.candidates.first().and_then(|c| c.finish_reason.as_deref()) {
            Some(reason) => format!("no text in reply (finish reason {reason})"),
            None => "no candidates in reply".to_string(),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn with_base_url(api_key: String, model: Option<String>, base_url: String) -> Result<Self, ServiceError> {
        Ok(Self {
            http: http::build_client()?,
            api_key,
            model: model
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature: 0.3,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn url(&self, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, self.model, method)
    }

    fn body<'a>(&self, system: Option<&'a str>, turns: &'a [ChatMessage]) -> GenerateRequest<'a> {
        GenerateRequest {
            system_instruction: system.map(|s| Content {
                role: None,
                parts: vec![Part { text: s }],
            }),
            contents: turns
                .iter()
                .map(|t| Content {
                    role: Some(match t.role {
                        Role::User => "user",
                        Role::Assistant => "model",
                    }),
                    parts: vec![Part { text: &t.text }],
                })
                .collect(),
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        }
    }

    fn post(
        &self,
        url: String,
        system: Option<&str>,
        turns: &[ChatMessage],
    ) -> Result<reqwest::blocking::Response, ServiceError> {
        log::debug!("gemini request: model={} turns={}", self.model, turns.len());
        let response = http::send(
            self.http
                .post(url)
                .header("x-goog-api-key", &self.api_key)
                .json(&self.body(system, turns)),
        )?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(error_from_body(status.as_u16(), &body))
    }
}

fn error_from_body(status: u16, body: &str) -> ServiceError {
    let Ok(parsed) = serde_json::from_str::<GeminiError>(body) else {
        return classify_status(status, http::snippet(body));
    };
    let detail = parsed.error;
    let key_invalid = detail
        .details
        .iter()
        .any(|d| d.get("reason").and_then(|r| r.as_str()) == Some("API_KEY_INVALID"));
    if key_invalid {
        return ServiceError::Auth(detail.message);
    }
    match detail.status.as_deref() {
        Some("UNAUTHENTICATED") | Some("PERMISSION_DENIED") => ServiceError::Auth(detail.message),
        Some("RESOURCE_EXHAUSTED") => ServiceError::Quota(detail.message),
        _ => classify_status(status, detail.message),
    }
}

impl ChatTransport for GeminiClient {
    fn complete(&self, system: Option<&str>, turns: &[ChatMessage]) -> Result<String, ServiceError> {
        let response = self.post(self.url("generateContent"), system, turns)?;
        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;
        parsed
            .text()
            .ok_or_else(|| ServiceError::InvalidResponse(parsed.empty_reason()))
    }

    fn complete_streaming(
        &self,
        system: Option<&str>,
        turns: &[ChatMessage],
        on_chunk: &mut dyn FnMut(&str),
    ) -> Result<String, ServiceError> {
        let url = format!("{}?alt=sse", self.url("streamGenerateContent"));
        let response = self.post(url, system, turns)?;

        let mut full = String::new();
        let mut last_reason = None;
        http::read_sse(BufReader::new(response), |data| {
            let chunk: GenerateResponse = serde_json::from_str(data)
                .map_err(|e| ServiceError::InvalidResponse(format!("stream chunk: {e}")))?;
            match chunk.text() {
                Some(text) => {
                    on_chunk(&text);
                    full.push_str(&text);
                }
                None => last_reason = Some(chunk.empty_reason()),
            }
            Ok(true)
        })?;

        if full.is_empty() {
            return Err(ServiceError::InvalidResponse(
                last_reason.unwrap_or_else(|| "empty stream".to_string()),
            ));
        }
        Ok(full)
    }
}
