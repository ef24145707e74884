//! Domain gate: is this a CPF question at all?

use std::collections::BTreeSet;

use crate::error::ConfigError;

/// CPF scheme terms, housing terms, and account-type terms.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "cpf",
    "medisave",
    "retirement",
    "housing",
    "hdb",
    "bto",
    "resale",
    "mortgage",
    "loan",
    "interest",
    "property",
    "downpayment",
    "grant",
    "ordinary",
    "special",
];

/// Keyword-overlap classifier.
///
/// A query is in-domain iff at least one of its lower-cased whitespace tokens
/// is in the vocabulary. Every keyword is a single token of two or more
/// characters, so one-letter or punctuation-only tokens cannot match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainGate {
    keywords: BTreeSet<String>,
}

impl DomainGate {
    /// Build a gate from a custom vocabulary.
    pub fn new<I, S>(keywords: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if keyword.chars().count() < 2 || keyword.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidKeyword { keyword });
            }
            set.insert(keyword);
        }
        if set.is_empty() {
            return Err(ConfigError::NoKeywords);
        }
        Ok(Self { keywords: set })
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }

    pub fn is_in_domain(&self, query: &str) -> bool {
        query
            .to_lowercase()
            .split_whitespace()
            .any(|token| self.keywords.contains(token))
    }
}

impl Default for DomainGate {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Classify `query` with the default vocabulary.
pub fn is_in_domain(query: &str) -> bool {
    DomainGate::default().is_in_domain(query)
}
