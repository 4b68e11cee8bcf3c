//! Gemini LLM client
//!
//! Calls the generateContent endpoint with a JSON response schema and
//! normalizes the reply. Rate limits and transport failures retry with
//! exponential backoff; other HTTP errors are terminal.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::prompt::build_prompt;
use super::{Answer, GatewayError, GatewayResult, LlmGateway, StructuredAnswer};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const MAX_ATTEMPTS: u32 = 5;
const BASE_DELAY: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Placeholder when the provider's envelope is missing expected fields
const UNEXPECTED_FORMAT: &str = "The AI provided an unexpected response format.";
/// Placeholder when the envelope is intact but the content part is empty
const EMPTY_RESPONSE: &str = "The AI did not provide a clear response.";

/// Raw outcome of one HTTP attempt
struct HttpReply {
    status: u16,
    body: String,
}

/// Connection-level failure (no HTTP status was received)
#[derive(Debug)]
struct TransportError(String);

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One POST to the provider endpoint.
///
/// Implementations surface connection-level failures as the error variant so
/// the retry loop can distinguish them from HTTP error statuses.
#[async_trait]
trait Transport: Send + Sync {
    async fn post_json(&self, url: &str, payload: &Value) -> Result<HttpReply, TransportError>;
}

struct ReqwestTransport {
    client: reqwest::Client,
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, url: &str, payload: &Value) -> Result<HttpReply, TransportError> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(HttpReply { status, body })
    }
}

/// Delay hook for the retry loop; swapped for a recording fake in tests
#[async_trait]
trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Gemini client wrapper
pub struct GeminiClient {
    api_key: Option<String>,
    model: String,
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
}

impl GeminiClient {
    /// Create a client for the given key and model.
    ///
    /// A missing key is allowed here; `answer` fails with
    /// `GatewayError::Configuration` before any request is sent.
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key,
            model: model.into(),
            transport: Arc::new(ReqwestTransport { client }),
            sleeper: Arc::new(TokioSleeper),
        })
    }
}

#[async_trait]
impl LlmGateway for GeminiClient {
    async fn answer(&self, query: &str) -> GatewayResult<Answer> {
        let Some(api_key) = self.api_key.as_deref().filter(|k| !k.is_empty()) else {
            tracing::error!("attempted to call the LLM without an API key");
            return Err(GatewayError::Configuration);
        };

        let url = format!("{API_BASE}/{}:generateContent?key={api_key}", self.model);
        let payload = request_payload(&build_prompt(query));

        for attempt in 0..MAX_ATTEMPTS {
            match self.transport.post_json(&url, &payload).await {
                Ok(HttpReply { status: 429, .. }) => {
                    if attempt + 1 == MAX_ATTEMPTS {
                        break;
                    }
                    let delay = backoff_delay(attempt);
                    tracing::info!(attempt, ?delay, "rate limited by LLM API, backing off");
                    self.sleeper.sleep(delay).await;
                }
                Ok(reply) if !(200..300).contains(&reply.status) => {
                    tracing::error!(status = reply.status, "LLM API error: {}", reply.body);
                    return Err(GatewayError::Upstream {
                        status: reply.status,
                        body: reply.body,
                    });
                }
                Ok(reply) => return Ok(parse_reply(&reply.body)),
                Err(err) => {
                    tracing::error!("network error calling LLM API: {err}");
                    if attempt + 1 == MAX_ATTEMPTS {
                        return Err(GatewayError::Unavailable(
                            "could not connect to the LLM service".to_string(),
                        ));
                    }
                    self.sleeper.sleep(backoff_delay(attempt)).await;
                }
            }
        }

        Err(GatewayError::Unavailable("exhausted retries".to_string()))
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    BASE_DELAY * 2u32.pow(attempt)
}

fn request_payload(prompt: &str) -> Value {
    json!({
        "contents": [
            { "role": "user", "parts": [{ "text": prompt }] }
        ],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema(),
        }
    })
}

/// Type constraints the provider applies to the generated JSON
fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "required_visa_documentation": { "type": "ARRAY", "items": { "type": "STRING" } },
            "passport_requirements": { "type": "ARRAY", "items": { "type": "STRING" } },
            "additional_necessary_documents": { "type": "ARRAY", "items": { "type": "STRING" } },
            "relevant_travel_advisories": { "type": "ARRAY", "items": { "type": "STRING" } },
            "general_response": { "type": "STRING" }
        }
    })
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ContentPart {
    text: Option<String>,
}

/// Normalize a 2xx reply body into an answer.
///
/// Shape anomalies degrade to an unstructured answer; this function never
/// fails.
fn parse_reply(body: &str) -> Answer {
    let envelope: GenerateResponse = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) => {
            tracing::warn!("unexpected LLM response structure: {body}");
            return Answer::Unstructured(UNEXPECTED_FORMAT.to_string());
        }
    };

    let text = envelope
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text);

    let Some(text) = text else {
        tracing::warn!("unexpected LLM response structure");
        return Answer::Unstructured(UNEXPECTED_FORMAT.to_string());
    };

    if text.is_empty() {
        tracing::warn!("LLM response content part is empty");
        return Answer::Unstructured(EMPTY_RESPONSE.to_string());
    }

    match serde_json::from_str::<StructuredAnswer>(&text) {
        Ok(parsed) => Answer::Structured(parsed),
        Err(_) => {
            tracing::warn!("LLM response was not valid JSON: {text}");
            Answer::Unstructured(text)
        }
    }
}
