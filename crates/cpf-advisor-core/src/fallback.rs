//! Single-call fallback responder.
//!
//! Used when the agent pipeline fails: one model call with the gathered
//! evidence as context.

use std::sync::Arc;
use std::time::Duration;

use cpf_evidence::EvidenceRecord;
use cpf_llm::{GenerationRequest, LlmError, TextGenerator};
use tracing::instrument;

/// System instruction for the fallback call.
pub const FALLBACK_SYSTEM_PROMPT: &str = "You are a CPF (Central Provident Fund) specialist assistant. \
Provide accurate, helpful information about CPF policies and regulations. \
Base your response on the context provided, and clearly indicate if you're unsure about any information. \
Format your response in a clear, structured manner.";

/// Sampling parameters for the fallback call.
#[derive(Debug, Clone)]
pub struct FallbackSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            max_tokens: 1000,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Why the fallback produced no answer.
#[derive(Debug, thiserror::Error)]
pub enum FallbackError {
    #[error("{0}")]
    Backend(#[from] LlmError),

    #[error("fallback timed out after {0}ms")]
    Timeout(u64),

    #[error("fallback reply was empty")]
    EmptyReply,

    #[error("fallback task panicked: {0}")]
    Panicked(String),
}

/// Evidence contents joined by blank lines, for use as fallback context.
pub fn evidence_context(evidence: &[EvidenceRecord]) -> String {
    evidence
        .iter()
        .map(|r| r.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub struct FallbackResponder {
    generator: Arc<dyn TextGenerator>,
    settings: FallbackSettings,
}

impl FallbackResponder {
    pub fn new(generator: Arc<dyn TextGenerator>, settings: FallbackSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    pub fn settings(&self) -> &FallbackSettings {
        &self.settings
    }

    /// Answer `query` from `context` with a single model call.
    ///
    /// Apology-style replies are accepted here; only a blank reply fails.
    #[instrument(skip(self, context), fields(context_chars = context.len()))]
    pub async fn try_respond(&self, query: &str, context: &str) -> Result<String, FallbackError> {
        let request = GenerationRequest::new(FALLBACK_SYSTEM_PROMPT)
            .with_user(format!("Context: {context}\n\nQuery: {query}"))
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);

        let reply = tokio::time::timeout(self.settings.timeout, self.generator.generate(request))
            .await
            .map_err(|_| FallbackError::Timeout(self.settings.timeout.as_millis() as u64))??;

        if reply.trim().is_empty() {
            return Err(FallbackError::EmptyReply);
        }
        Ok(reply)
    }

    /// Like [`try_respond`](Self::try_respond) but renders failures as text.
    pub async fn respond(&self, query: &str, context: &str) -> String {
        match self.try_respond(query, context).await {
            Ok(text) => text,
            Err(e) => format!("Error getting fallback response: {e}"),
        }
    }
}
