use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::InferenceError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_OLLAMA_MODEL: &str = "qwen2.5:1.5b";

/// Remote text-generation capability: prompt in, raw model text out.
///
/// Implementations make exactly one attempt per call.
pub trait TextInference: Send + Sync {
    fn infer_text(&self, prompt: &str) -> Result<String, InferenceError>;

    /// Short name for logs and traces.
    fn name(&self) -> &str;
}

fn http_client(timeout: Duration) -> Result<reqwest::blocking::Client, InferenceError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| InferenceError::Network(e.to_string()))
}

fn map_send_error(err: reqwest::Error, timeout: Duration) -> InferenceError {
    if err.is_timeout() {
        InferenceError::Timeout {
            seconds: timeout.as_secs(),
        }
    } else {
        InferenceError::Network(err.to_string())
    }
}

/// Reject non-2xx answers, keeping a short excerpt of the body.
fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, InferenceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(InferenceError::Status {
        code: status.as_u16(),
        body: body.chars().take(200).collect(),
    })
}

// ============================================================================
// Ollama Backend
// ============================================================================

pub struct OllamaBackend {
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OLLAMA_ENDPOINT.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'static str,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaBackend {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl TextInference for OllamaBackend {
    fn infer_text(&self, prompt: &str) -> Result<String, InferenceError> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: "json",
        };

        debug!(endpoint = %self.endpoint, model = %self.model, "sending ollama request");
        let response = http_client(self.timeout)?
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| map_send_error(e, self.timeout))?;

        let body: OllamaResponse = check_status(response)?
            .json()
            .map_err(|e| InferenceError::Body(e.to_string()))?;
        Ok(body.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

// ============================================================================
// Hosted text-generation endpoint
// ============================================================================

/// Shared inference endpoints speaking the `{"inputs": ...}` protocol
/// (Hugging Face style). Answers with `[{"generated_text": ...}]` or a bare
/// object.
pub struct HostedBackend {
    pub endpoint: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
    pub max_new_tokens: u32,
}

#[derive(Serialize)]
struct HostedRequest<'a> {
    inputs: &'a str,
    parameters: HostedParameters,
}

#[derive(Serialize)]
struct HostedParameters {
    max_new_tokens: u32,
    return_full_text: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HostedResponse {
    Many(Vec<Generated>),
    One(Generated),
}

#[derive(Deserialize)]
struct Generated {
    generated_text: String,
}

impl HostedBackend {
    pub fn new(endpoint: &str, api_token: Option<&str>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            api_token: api_token.map(|t| t.to_string()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_new_tokens: 1024,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl TextInference for HostedBackend {
    fn infer_text(&self, prompt: &str) -> Result<String, InferenceError> {
        let request = HostedRequest {
            inputs: prompt,
            parameters: HostedParameters {
                max_new_tokens: self.max_new_tokens,
                return_full_text: false,
            },
        };

        let mut builder = http_client(self.timeout)?
            .post(&self.endpoint)
            .json(&request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        debug!(endpoint = %self.endpoint, "sending hosted inference request");
        let response = builder
            .send()
            .map_err(|e| map_send_error(e, self.timeout))?;

        let body: HostedResponse = check_status(response)?
            .json()
            .map_err(|e| InferenceError::Body(e.to_string()))?;

        match body {
            HostedResponse::One(g) => Ok(g.generated_text),
            HostedResponse::Many(items) => items
                .into_iter()
                .next()
                .map(|g| g.generated_text)
                .ok_or_else(|| InferenceError::Body("empty generation list".into())),
        }
    }

    fn name(&self) -> &str {
        "hosted"
    }
}

// ============================================================================
// Mock Backend (for testing without a model)
// ============================================================================

/// Returns the same canned text for every prompt.
pub struct MockTextInference {
    pub response: String,
}

impl MockTextInference {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

impl TextInference for MockTextInference {
    fn infer_text(&self, _prompt: &str) -> Result<String, InferenceError> {
        Ok(self.response.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
