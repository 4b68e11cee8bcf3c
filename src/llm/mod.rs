//! LLM gateway layer
//!
//! Builds prompts, calls the Gemini API with retry/backoff, and normalizes
//! replies into structured answers.

mod error;
mod gemini;
mod prompt;

pub use error::{GatewayError, GatewayResult};
pub use gemini::GeminiClient;
pub use prompt::build_prompt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Structured content extracted from the model's JSON reply.
///
/// The four category fields always materialize: a key the model omitted
/// deserializes to an empty vector, so "not applicable" and "absent" are the
/// same empty state. Unknown keys in the model's JSON are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredAnswer {
    #[serde(default)]
    pub required_visa_documentation: Vec<String>,
    #[serde(default)]
    pub passport_requirements: Vec<String>,
    #[serde(default)]
    pub additional_necessary_documents: Vec<String>,
    #[serde(default)]
    pub relevant_travel_advisories: Vec<String>,
    #[serde(default)]
    pub general_response: Option<String>,
}

impl StructuredAnswer {
    /// True when every category is empty and there is no general response
    pub fn is_empty(&self) -> bool {
        self.required_visa_documentation.is_empty()
            && self.passport_requirements.is_empty()
            && self.additional_necessary_documents.is_empty()
            && self.relevant_travel_advisories.is_empty()
            && self
                .general_response
                .as_deref()
                .map_or(true, |s| s.is_empty())
    }
}

/// Outcome of a gateway call
///
/// `Unstructured` carries raw model output that did not match the schema,
/// or a placeholder message when the provider's envelope was unusable.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Structured(StructuredAnswer),
    Unstructured(String),
}

/// Trait for LLM backends
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Answer a raw user query
    async fn answer(&self, query: &str) -> GatewayResult<Answer>;
}
