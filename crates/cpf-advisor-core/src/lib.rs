//! CPF Advisor Core
//!
//! Decides whether a question is about CPF, gathers evidence from official
//! CPF pages, and answers through a three-agent pipeline with a single-call
//! fallback.
//!
//! ## Layer 3 - Orchestration
//!
//! - [`gate`]: keyword domain classifier
//! - [`pipeline`]: research → advise → write task graph
//! - [`fallback`]: single-call responder used when the pipeline fails
//! - [`orchestrator`]: routes one query to exactly one [`Answer`]
//! - [`session`]: per-session conversation history
//! - [`config`]: TOML configuration
//! - [`obs`] / [`telemetry`]: structured events and subscriber setup

pub mod answer;
pub mod config;
pub mod error;
pub mod fallback;
pub mod gate;
pub mod obs;
pub mod orchestrator;
pub mod pipeline;
pub mod session;
pub mod telemetry;

pub use answer::{Answer, ERROR_MESSAGE_PREFIX, REFUSAL_MESSAGE};
pub use config::{
    AdvisorConfig, FallbackSection, FetchSection, GateSection, ModelSection, PipelineSection,
};
pub use error::{AdvisorError, AdvisorResult, ConfigError};
pub use fallback::{
    evidence_context, FallbackError, FallbackResponder, FallbackSettings, FALLBACK_SYSTEM_PROMPT,
};
pub use gate::{is_in_domain, DomainGate, DEFAULT_KEYWORDS};
pub use orchestrator::{Orchestrator, DEFAULT_REQUEST_TIMEOUT};
pub use pipeline::{
    build_task_plan, classify_reply, standard_tasks, AgentPipeline, AgentProfile, AgentRole,
    AgentTask, CrewPipeline, PipelineError, PipelineResult, PipelineRun, PipelineSettings,
    ReplyRejection, StageRecord, StageState, TaskId, TaskPlan,
};
pub use session::{ConversationEntry, Session, SharedSession};
pub use telemetry::init_tracing;

/// Crate version, shown by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
