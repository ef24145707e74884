//! Error types for the answer pipeline.

use cpf_llm::LlmError;

use crate::pipeline::{plan::TaskId, reply::ReplyRejection, roles::AgentRole};

/// Errors produced by the answer pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("task plan contains no tasks")]
    EmptyPlan,

    #[error("task {0} is declared more than once")]
    DuplicateTask(TaskId),

    #[error("task {task} depends on unknown task {dependency}")]
    UnknownDependency { task: TaskId, dependency: TaskId },

    #[error("task plan contains a dependency cycle")]
    CyclicDependencies,

    #[error("invalid task plan: {reason}")]
    InvalidPlan { reason: String },

    #[error("{role} stage backend error: {source}")]
    Backend {
        role: AgentRole,
        #[source]
        source: LlmError,
    },

    #[error("{role} stage timed out after {timeout_ms}ms")]
    StageTimeout { role: AgentRole, timeout_ms: u64 },

    #[error("{role} stage produced an unusable reply: {reason}")]
    StageRejected {
        role: AgentRole,
        reason: ReplyRejection,
    },

    #[error("pipeline task panicked: {0}")]
    Panicked(String),

    #[error("pipeline timed out after {0}ms")]
    Timeout(u64),
}

impl PipelineError {
    /// Role of the stage that failed, when the failure belongs to one stage.
    pub fn role(&self) -> Option<AgentRole> {
        match self {
            PipelineError::Backend { role, .. }
            | PipelineError::StageTimeout { role, .. }
            | PipelineError::StageRejected { role, .. } => Some(*role),
            _ => None,
        }
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
