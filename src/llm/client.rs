// HTTP client for generation backends

use crate::config::{LlmConfig, LlmProvider};
use crate::error::{Error, Result};
use crate::llm::retry::{AttemptError, RetryPolicy};
use crate::llm::TextGenerator;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const OPENAI_URL: &str = "https://api.openai.com/v1";
const OLLAMA_URL: &str = "http://localhost:11434";

/// Blocking client for the configured provider, with retries
pub struct LlmClient {
    config: LlmConfig,
    retry: RetryPolicy,
    client: reqwest::blocking::Client,
}

/// Request to the Gemini API
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

/// Response from the Gemini API
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

/// Request to the OpenAI API
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIRequestMessage>,
}

#[derive(Debug, Serialize)]
struct OpenAIRequestMessage {
    role: String,
    content: String,
}

/// Response from the OpenAI API
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

/// Response from the Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

impl LlmClient {
    /// Create a client; fails when the provider needs a key and none is set
    pub fn new(config: LlmConfig) -> Result<Self> {
        if let Some(var) = config.provider.api_key_var() {
            if config.api_key.is_none() {
                return Err(Error::MissingApiKey {
                    var: var.to_string(),
                });
            }
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::llm(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            retry: RetryPolicy::from_config(&config),
            config,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn api_key(&self) -> std::result::Result<&str, AttemptError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| AttemptError::Permanent(Error::llm("API key not configured")))
    }

    fn base_url(&self, default: &'static str) -> String {
        self.config
            .api_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }

    fn query_once(&self, prompt: &str) -> std::result::Result<String, AttemptError> {
        let text = match self.config.provider {
            LlmProvider::Gemini => self.query_gemini(prompt)?,
            LlmProvider::OpenAI => self.query_openai(prompt)?,
            LlmProvider::Ollama => self.query_ollama(prompt)?,
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(AttemptError::Transient(Error::llm("Empty response from model")));
        }
        Ok(text.to_string())
    }

    fn query_gemini(&self, prompt: &str) -> std::result::Result<String, AttemptError> {
        let endpoint = format!(
            "{}/models/{}:generateContent",
            self.base_url(GEMINI_URL),
            self.config.model
        );
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&endpoint)
            .header("x-goog-api-key", self.api_key()?)
            .json(&request)
            .send()
            .map_err(|e| transport_error("Gemini", e))?;
        let response = check_status("Gemini", response)?;

        let result: GeminiResponse = response.json().map_err(|e| {
            AttemptError::Transient(Error::llm(format!("Failed to parse Gemini response: {}", e)))
        })?;

        Ok(result
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join(""))
    }

    fn query_openai(&self, prompt: &str) -> std::result::Result<String, AttemptError> {
        let endpoint = format!("{}/chat/completions", self.base_url(OPENAI_URL));
        let request = OpenAIRequest {
            model: self.config.model.clone(),
            messages: vec![OpenAIRequestMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key()?))
            .json(&request)
            .send()
            .map_err(|e| transport_error("OpenAI", e))?;
        let response = check_status("OpenAI", response)?;

        let result: OpenAIResponse = response.json().map_err(|e| {
            AttemptError::Transient(Error::llm(format!("Failed to parse OpenAI response: {}", e)))
        })?;

        Ok(result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    fn query_ollama(&self, prompt: &str) -> std::result::Result<String, AttemptError> {
        let endpoint = format!("{}/api/generate", self.base_url(OLLAMA_URL));
        let body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false
        });

        let response = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .map_err(|e| transport_error("Ollama", e))?;
        let response = check_status("Ollama", response)?;

        let result: OllamaResponse = response.json().map_err(|e| {
            AttemptError::Transient(Error::llm(format!("Failed to parse Ollama response: {}", e)))
        })?;

        Ok(result.response)
    }
}

impl TextGenerator for LlmClient {
    fn generate(&self, prompt: &str) -> Result<String> {
        debug!(
            model = %self.config.model,
            prompt_chars = prompt.len(),
            "Sending generation request"
        );
        self.retry.run(|_| self.query_once(prompt))
    }
}

fn transport_error(provider: &str, e: reqwest::Error) -> AttemptError {
    AttemptError::Transient(Error::llm(format!("{} request failed: {}", provider, e)))
}

/// Whether a failed status is worth retrying
pub(crate) fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn check_status(
    provider: &str,
    response: reqwest::blocking::Response,
) -> std::result::Result<reqwest::blocking::Response, AttemptError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error = Error::llm(format!("{} returned status {}", provider, status));
    if is_retryable_status(status) {
        Err(AttemptError::Transient(error))
    } else {
        Err(AttemptError::Permanent(error))
    }
}
