//! The four possible outcomes of a query and their rendered text.

use serde::Serialize;

/// Returned for out-of-domain queries.
pub const REFUSAL_MESSAGE: &str = "I apologize, but I can only answer questions related to CPF (Central Provident Fund). Please ask a CPF-related question.";

/// Prefix of the generic apology used when every answer path failed.
pub const ERROR_MESSAGE_PREFIX: &str =
    "I apologize, but I encountered an error processing your request";

const ANALYSIS_HEADING: &str = "AI Analysis";
const FALLBACK_HEADING: &str = "AI Response (Fallback)";

/// Outcome of handling one query. Exactly one variant per query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Answer {
    /// Out-of-domain query; nothing was fetched.
    Refused,
    /// Agent pipeline answer.
    Analysis { text: String, sources: Vec<String> },
    /// Single-call fallback answer.
    Fallback { text: String, sources: Vec<String> },
    /// Pipeline and fallback both failed, or the request ran out of time.
    Failed { reason: String },
}

impl Answer {
    pub fn kind(&self) -> &'static str {
        match self {
            Answer::Refused => "refused",
            Answer::Analysis { .. } => "analysis",
            Answer::Fallback { .. } => "fallback",
            Answer::Failed { .. } => "failed",
        }
    }

    pub fn sources(&self) -> &[String] {
        match self {
            Answer::Analysis { sources, .. } | Answer::Fallback { sources, .. } => sources,
            Answer::Refused | Answer::Failed { .. } => &[],
        }
    }

    /// User-facing text. Never empty.
    pub fn render(&self) -> String {
        match self {
            Answer::Refused => REFUSAL_MESSAGE.to_string(),
            Answer::Analysis { text, sources } => with_sources(ANALYSIS_HEADING, text, sources),
            Answer::Fallback { text, sources } => with_sources(FALLBACK_HEADING, text, sources),
            Answer::Failed { reason } => format!("{ERROR_MESSAGE_PREFIX}: {reason}"),
        }
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

fn with_sources(heading: &str, text: &str, sources: &[String]) -> String {
    let list = sources
        .iter()
        .map(|url| format!("- {url}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("### {heading}\n{text}\n\n### Sources\n{list}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_layout() {
        let answer = Answer::Analysis {
            text: "Body".to_string(),
            sources: vec!["https://a".to_string(), "https://b".to_string()],
        };
        assert_eq!(
            answer.render(),
            "### AI Analysis\nBody\n\n### Sources\n- https://a\n- https://b"
        );
        assert_eq!(answer.kind(), "analysis");
    }

    #[test]
    fn test_fallback_layout_with_no_sources_keeps_heading() {
        let answer = Answer::Fallback {
            text: "Body".to_string(),
            sources: vec![],
        };
        assert_eq!(
            answer.render(),
            "### AI Response (Fallback)\nBody\n\n### Sources\n"
        );
    }

    #[test]
    fn test_refusal_and_failure_text() {
        assert_eq!(Answer::Refused.render(), REFUSAL_MESSAGE);
        let failed = Answer::Failed {
            reason: "boom".to_string(),
        };
        assert_eq!(
            failed.to_string(),
            "I apologize, but I encountered an error processing your request: boom"
        );
        assert!(failed.sources().is_empty());
    }

    #[test]
    fn test_answer_serializes_with_kind_tag() {
        let json = serde_json::to_value(Answer::Refused).unwrap();
        assert_eq!(json["kind"], "refused");
    }
}
