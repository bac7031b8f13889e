// Generative model client
// One operation: turn a prompt (plus optional output schema) into text via the Gemini REST API

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ClientConfig;

// Wire-level failures of a model call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("no API credential configured")]
    MissingCredential,

    #[error("API credential rejected: {0}")]
    InvalidCredential(String),

    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("response blocked: {0}")]
    Blocked(String),

    #[error("model returned no text")]
    EmptyResponse,

    #[error("request timeout after {0}ms")]
    Timeout(u64),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error: {status_code} - {message}")]
    Status { status_code: u16, message: String },

    #[error("undecodable response: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    Text,
    Json { schema: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
    pub format: ResponseFormat,
}

impl GenerateRequest {
    pub fn text(model: impl Into<String>, prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature,
            max_output_tokens: None,
            format: ResponseFormat::Text,
        }
    }

    pub fn json(
        model: impl Into<String>,
        prompt: impl Into<String>,
        temperature: f32,
        schema: Value,
    ) -> Self {
        Self {
            format: ResponseFormat::Json { schema },
            ..Self::text(model, prompt, temperature)
        }
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}

#[async_trait]
pub trait GenerativeModel: Send + Sync + 'static {
    // Generate content for a prompt; JSON text when a schema is requested
    async fn generate(&self, request: GenerateRequest) -> Result<String, ModelError>;
}

pub struct GeminiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl GeminiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        reqwest::Url::parse(&config.base_url)
            .map_err(|e| ClientError::ConfigError(format!("invalid base url: {}", e)))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self { http, config })
    }

    pub fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    fn transport_error(&self, err: reqwest::Error) -> ModelError {
        if err.is_timeout() {
            ModelError::Timeout(self.config.timeout_ms)
        } else {
            ModelError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, ModelError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(ModelError::MissingCredential)?;

        let url = self.endpoint(&request.model);
        let payload = build_request_body(&request);
        let started = Instant::now();
        debug!(model = %request.model, prompt_chars = request.prompt.len(), "sending generateContent request");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body: Bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if !status.is_success() {
            let err = interpret_error(status.as_u16(), &body);
            warn!(model = %request.model, status = status.as_u16(), elapsed_ms, error = %err, "model call failed");
            return Err(err);
        }

        debug!(model = %request.model, elapsed_ms, response_bytes = body.len(), "model call succeeded");
        interpret_response(&body)
    }
}

// Request/response shapes of the generateContent endpoint

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig<'a> {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeminiCandidateContent {
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeminiErrorBody {
    code: u16,
    message: String,
    status: String,
    details: Vec<Value>,
}

const BLOCKING_FINISH_REASONS: [&str; 4] = ["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

pub fn build_request_body(request: &GenerateRequest) -> Value {
    let (response_mime_type, response_schema) = match &request.format {
        ResponseFormat::Text => (None, None),
        ResponseFormat::Json { schema } => (Some("application/json"), Some(schema)),
    };

    let body = GeminiRequest {
        contents: vec![GeminiContent {
            role: "user",
            parts: vec![GeminiPart {
                text: &request.prompt,
            }],
        }],
        generation_config: GeminiGenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
            response_mime_type,
            response_schema,
        },
    };

    serde_json::to_value(body).unwrap_or(Value::Null)
}

/// Extracts the generated text from a successful response body.
pub fn interpret_response(body: &[u8]) -> Result<String, ModelError> {
    let response: GeminiResponse =
        serde_json::from_slice(body).map_err(|e| ModelError::Decode(e.to_string()))?;

    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(ModelError::Blocked(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(ModelError::EmptyResponse)?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if BLOCKING_FINISH_REASONS.contains(&reason) {
            return Err(ModelError::Blocked(reason.to_string()));
        }
    }

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ModelError::EmptyResponse);
    }
    Ok(text)
}

/// Classifies a non-success HTTP response.
pub fn interpret_error(status_code: u16, body: &[u8]) -> ModelError {
    let envelope: GeminiErrorEnvelope = serde_json::from_slice(body).unwrap_or_default();
    let error = envelope.error;
    let message = if error.message.is_empty() {
        String::from_utf8_lossy(body).trim().to_string()
    } else {
        error.message
    };

    let invalid_key = error
        .details
        .iter()
        .any(|detail| detail.get("reason").and_then(Value::as_str) == Some("API_KEY_INVALID"));

    if status_code == 401 || status_code == 403 || invalid_key {
        ModelError::InvalidCredential(message)
    } else if status_code == 429 || error.status == "RESOURCE_EXHAUSTED" {
        ModelError::QuotaExceeded(message)
    } else {
        ModelError::Status {
            status_code: if error.code != 0 { error.code } else { status_code },
            message,
        }
    }
}
