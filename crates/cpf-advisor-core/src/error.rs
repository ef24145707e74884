//! Startup-level error taxonomy for the advisor.
//!
//! Request handling never returns these: every query produces a string. They
//! surface only while loading configuration and wiring components.

use cpf_evidence::{CatalogError, FetchError};
use cpf_llm::LlmError;

/// Configuration validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field} must be between 0.0 and 2.0, got {value}")]
    TemperatureOutOfRange { field: &'static str, value: f32 },

    #[error("domain keyword {keyword:?} must be a single token of at least two characters")]
    InvalidKeyword { keyword: String },

    #[error("domain keyword list must not be empty")]
    NoKeywords,
}

/// Advisor errors.
#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid reference catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("fetcher setup failed: {0}")]
    Fetcher(#[from] FetchError),

    #[error("text generation setup failed: {0}")]
    Generator(#[from] LlmError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for advisor setup operations.
pub type AdvisorResult<T> = std::result::Result<T, AdvisorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = AdvisorError::from(ConfigError::NotPositive {
            field: "fetch.timeout_secs",
        });
        assert!(err.to_string().contains("invalid configuration"));
        assert!(err.to_string().contains("fetch.timeout_secs"));
    }

    #[test]
    fn test_catalog_error_converts() {
        let err: AdvisorError = CatalogError::MissingGeneralInfo("general_info".to_string()).into();
        assert!(err.to_string().contains("general_info"));
    }

    #[test]
    fn test_invalid_keyword_is_quoted() {
        let err = ConfigError::InvalidKeyword {
            keyword: "ordinary account".to_string(),
        };
        assert!(err.to_string().contains("\"ordinary account\""));
    }
}
