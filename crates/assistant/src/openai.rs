// OpenAI chat completions transport

use std::io::BufReader;

use serde::{Deserialize, Serialize};

use crate::error::{classify_status, ServiceError};
use crate::http;
use crate::service::{ChatMessage, ChatTransport};

pub const DEFAULT_MODEL: &str = "gpt-4o";

// ============================================================================
// OpenAI API types
// ============================================================================

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Serialize)]
struct OpenAIMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAIStreamChoice>,
}

#[derive(Deserialize)]
struct OpenAIStreamChoice {
    delta: OpenAIDelta,
}

#[derive(Deserialize)]
struct OpenAIDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIError {
    error: OpenAIErrorDetail,
}

#[derive(Deserialize)]
struct OpenAIErrorDetail {
    message: String,
    code: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

pub struct OpenAIClient {
    http: reqwest::blocking::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

impl OpenAIClient {
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

    fn post(
        &self,
        system: Option<&str>,
        turns: &[ChatMessage],
        stream: bool,
    ) -> Result<reqwest::blocking::Response, ServiceError> {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        if let Some(system) = system {
            messages.push(OpenAIMessage {
                role: "system",
                content: system,
            });
        }
        messages.extend(turns.iter().map(|t| OpenAIMessage {
            role: t.role.as_str(),
            content: &t.text,
        }));

        let request = OpenAIRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: 2048,
            stream,
        };

        log::debug!("openai request: model={} turns={} stream={}", self.model, turns.len(), stream);
        let response = http::send(
            self.http
                .post(format!("{}/v1/chat/completions", self.base_url))
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&request),
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
    match serde_json::from_str::<OpenAIError>(body) {
        Ok(parsed) => match parsed.error.code.as_deref() {
            Some("invalid_api_key") => ServiceError::Auth(parsed.error.message),
            Some("insufficient_quota") => ServiceError::Quota(parsed.error.message),
            _ => classify_status(status, parsed.error.message),
        },
        Err(_) => classify_status(status, http::snippet(body)),
    }
}

impl ChatTransport for OpenAIClient {
    fn complete(&self, system: Option<&str>, turns: &[ChatMessage]) -> Result<String, ServiceError> {
        let response = self.post(system, turns, false)?;
        let body: OpenAIResponse = response
            .json()
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ServiceError::InvalidResponse("No choices in response".to_string()))
    }

    fn complete_streaming(
        &self,
        system: Option<&str>,
        turns: &[ChatMessage],
        on_chunk: &mut dyn FnMut(&str),
    ) -> Result<String, ServiceError> {
        let response = self.post(system, turns, true)?;

        let mut full = String::new();
        http::read_sse(BufReader::new(response), |data| {
            if data.trim() == "[DONE]" {
                return Ok(false);
            }
            let chunk: OpenAIStreamChunk = serde_json::from_str(data)
                .map_err(|e| ServiceError::InvalidResponse(format!("stream chunk: {e}")))?;
            for choice in chunk.choices {
                if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                    on_chunk(&text);
                    full.push_str(&text);
                }
            }
            Ok(true)
        })?;

        if full.is_empty() {
            return Err(ServiceError::InvalidResponse("empty stream".to_string()));
        }
        Ok(full)
    }
}
