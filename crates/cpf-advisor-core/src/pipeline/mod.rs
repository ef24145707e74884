//! Multi-agent answer pipeline.
//!
//! Three role-specialized agents (research analyst, housing advisor, content
//! writer) work through a dependency-ordered task graph over a shared
//! [`TextGenerator`](cpf_llm::TextGenerator).
//!
//! # Module layout
//!
//! - [`roles`]: `AgentRole`, `AgentProfile`
//! - [`plan`]: `AgentTask`, `TaskPlan`, `build_task_plan`, `standard_tasks`
//! - [`reply`]: `classify_reply`, `ReplyRejection`
//! - [`error`]: `PipelineError`, `PipelineResult`
//! - [`executor`]: `AgentPipeline`, `CrewPipeline`, `PipelineRun`

pub mod error;
pub mod executor;
pub mod plan;
pub mod reply;
pub mod roles;

pub use error::{PipelineError, PipelineResult};
pub use executor::{
    AgentPipeline, CrewPipeline, PipelineRun, PipelineSettings, StageRecord, StageState,
};
pub use plan::{build_task_plan, standard_tasks, AgentTask, TaskId, TaskPlan};
pub use reply::{classify_reply, ReplyRejection};
pub use roles::{AgentProfile, AgentRole};
