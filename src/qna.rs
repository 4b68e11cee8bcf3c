//! Query orchestration
//!
//! Resolves identifiers, invokes the LLM gateway, renders the answer into
//! markdown text, and records the interaction in history.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{Database, HistoryRecord, NewHistoryRecord};
use crate::llm::{Answer, GatewayError, LlmGateway, StructuredAnswer};

/// Text used when a structured answer carries no content at all
const NO_INFORMATION: &str = "No specific information found.";

/// Failures that cross the orchestrator boundary
#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Anything not already classified by the gateway (e.g. persistence)
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result of handling one query
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub ai_response: String,
    pub structured: Option<StructuredAnswer>,
    pub user_id: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Orchestrates a single question/answer round trip
#[derive(Clone)]
pub struct QnaService {
    gateway: Arc<dyn LlmGateway>,
    db: Database,
}

impl QnaService {
    pub fn new(gateway: Arc<dyn LlmGateway>, db: Database) -> Self {
        Self { gateway, db }
    }

    /// Handle a query end to end: answer it, render it, record it.
    ///
    /// Missing or empty identifiers are replaced with fresh UUIDs, so every
    /// persisted record has non-empty `user_id` and `session_id`.
    pub async fn handle(
        &self,
        query: &str,
        user_id: Option<String>,
        session_id: Option<String>,
    ) -> Result<QueryOutcome, QueryError> {
        let user_id = resolve_id(user_id);
        let session_id = resolve_id(session_id);
        let timestamp = Utc::now();

        let (ai_response, structured) = match self.gateway.answer(query).await? {
            Answer::Structured(answer) => {
                let text = render(&answer);
                (text, Some(answer))
            }
            Answer::Unstructured(text) => (text, None),
        };

        self.db.append_history(NewHistoryRecord {
            user_id: user_id.clone(),
            session_id: session_id.clone(),
            query_text: query.to_string(),
            response_text: ai_response.clone(),
            timestamp,
        })?;
        tracing::info!(%user_id, %session_id, "query stored in history");

        Ok(QueryOutcome {
            ai_response,
            structured,
            user_id,
            session_id,
            timestamp,
        })
    }

    /// List a user's history, newest first
    pub fn history(&self, user_id: &str) -> Result<Vec<HistoryRecord>, QueryError> {
        Ok(self.db.history_for_user(user_id)?)
    }
}

fn resolve_id(id: Option<String>) -> String {
    id.filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Render a structured answer as markdown text.
///
/// Sections appear in fixed order with bold headers and bullet lists; empty
/// categories are omitted and general prose trails at the end.
pub fn render(answer: &StructuredAnswer) -> String {
    let mut sections = Vec::new();

    push_section(
        &mut sections,
        "Required Visa Documentation",
        &answer.required_visa_documentation,
    );
    push_section(
        &mut sections,
        "Passport Requirements",
        &answer.passport_requirements,
    );
    push_section(
        &mut sections,
        "Additional Necessary Documents",
        &answer.additional_necessary_documents,
    );
    push_section(
        &mut sections,
        "Relevant Travel Advisories",
        &answer.relevant_travel_advisories,
    );

    if let Some(general) = answer.general_response.as_deref().filter(|s| !s.is_empty()) {
        sections.push(general.to_string());
    }

    if sections.is_empty() {
        return NO_INFORMATION.to_string();
    }

    sections.join("\n\n")
}

fn push_section(sections: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let bullets: Vec<String> = items.iter().map(|item| format!("- {item}")).collect();
    sections.push(format!("**{title}:**\n{}", bullets.join("\n")));
}
