//! Advisor configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Secrets never live here; see `cpf_llm::OpenAiConfig`.
//!
//! ```toml
//! request_timeout_secs = 180
//!
//! [fetch]
//! timeout_secs = 10
//! max_concurrency = 4
//!
//! [gate]
//! keywords = ["cpf", "hdb", "medishield"]
//!
//! [[catalog]]
//! name = "general_info"
//! urls = ["https://www.cpf.gov.sg/"]
//! ```

use std::path::Path;
use std::time::Duration;

use cpf_evidence::{
    CatalogCategory, FetcherConfig, GatherConfig, ReferenceCatalog, DEFAULT_MAX_CONTENT_CHARS,
    DEFAULT_USER_AGENT,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AdvisorResult, ConfigError};
use crate::fallback::FallbackSettings;
use crate::gate::DomainGate;
use crate::pipeline::PipelineSettings;

/// `[fetch]`: page retrieval limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    pub timeout_secs: u64,
    pub max_concurrency: usize,
    pub deadline_secs: u64,
    pub max_content_chars: usize,
    pub user_agent: String,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_concurrency: 4,
            deadline_secs: 30,
            max_content_chars: DEFAULT_MAX_CONTENT_CHARS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// `[model]`: text-generation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    /// Model name; `OPENAI_MODEL` takes precedence.
    pub name: String,
    /// Bound on each model call.
    pub timeout_secs: u64,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            name: cpf_llm::DEFAULT_MODEL.to_string(),
            timeout_secs: 60,
        }
    }
}

/// `[pipeline]`: sampling for the three agent stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1500,
        }
    }
}

/// `[fallback]`: sampling for the single-call fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackSection {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for FallbackSection {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            max_tokens: 1000,
        }
    }
}

/// `[gate]`: domain vocabulary override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSection {
    pub keywords: Option<Vec<String>>,
}

fn default_request_timeout_secs() -> u64 {
    180
}

/// Top-level advisor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Deadline for handling one query end to end.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub fetch: FetchSection,
    #[serde(default)]
    pub model: ModelSection,
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub fallback: FallbackSection,
    #[serde(default)]
    pub gate: GateSection,
    /// Replaces the built-in catalog when non-empty.
    #[serde(default)]
    pub catalog: Vec<CatalogCategory>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            fetch: FetchSection::default(),
            model: ModelSection::default(),
            pipeline: PipelineSection::default(),
            fallback: FallbackSection::default(),
            gate: GateSection::default(),
            catalog: Vec::new(),
        }
    }
}

impl AdvisorConfig {
    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> AdvisorResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        debug!(path = %path.display(), "loaded advisor configuration");
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(raw: &str) -> AdvisorResult<Self> {
        let config: AdvisorConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// `load` when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> AdvisorResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Check numeric limits, the gate vocabulary and the catalog.
    pub fn validate(&self) -> AdvisorResult<()> {
        let positive: [(&'static str, u64); 6] = [
            ("request_timeout_secs", self.request_timeout_secs),
            ("fetch.timeout_secs", self.fetch.timeout_secs),
            ("fetch.max_concurrency", self.fetch.max_concurrency as u64),
            ("fetch.deadline_secs", self.fetch.deadline_secs),
            ("fetch.max_content_chars", self.fetch.max_content_chars as u64),
            ("model.timeout_secs", self.model.timeout_secs),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::NotPositive { field }.into());
            }
        }
        let sampling = [
            ("pipeline", self.pipeline.temperature, self.pipeline.max_tokens),
            ("fallback", self.fallback.temperature, self.fallback.max_tokens),
        ];
        for (field, temperature, max_tokens) in sampling {
            if max_tokens == 0 {
                return Err(ConfigError::NotPositive { field }.into());
            }
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::TemperatureOutOfRange {
                    field,
                    value: temperature,
                }
                .into());
            }
        }
        self.domain_gate()?;
        self.reference_catalog()?;
        Ok(())
    }

    /// The configured catalog, or the built-in one.
    pub fn reference_catalog(&self) -> AdvisorResult<ReferenceCatalog> {
        if self.catalog.is_empty() {
            return Ok(ReferenceCatalog::builtin());
        }
        Ok(ReferenceCatalog::new(self.catalog.clone())?)
    }

    /// The configured gate vocabulary, or the built-in one.
    pub fn domain_gate(&self) -> Result<DomainGate, ConfigError> {
        match &self.gate.keywords {
            Some(keywords) => DomainGate::new(keywords),
            None => Ok(DomainGate::default()),
        }
    }

    pub fn gather_config(&self) -> GatherConfig {
        GatherConfig {
            max_concurrency: self.fetch.max_concurrency,
            fetch_timeout: Duration::from_secs(self.fetch.timeout_secs),
            deadline: Duration::from_secs(self.fetch.deadline_secs),
            max_content_chars: self.fetch.max_content_chars,
        }
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            connect_timeout: Duration::from_secs(self.fetch.timeout_secs),
            ..FetcherConfig::default()
        }
        .with_user_agent(&self.fetch.user_agent)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            temperature: self.pipeline.temperature,
            max_tokens: self.pipeline.max_tokens,
            stage_timeout: Duration::from_secs(self.model.timeout_secs),
        }
    }

    pub fn fallback_settings(&self) -> FallbackSettings {
        FallbackSettings {
            temperature: self.fallback.temperature,
            max_tokens: self.fallback.max_tokens,
            timeout: Duration::from_secs(self.model.timeout_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
