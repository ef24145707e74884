//! Dependency-ordered execution of the agent task graph.
//!
//! [`CrewPipeline`] runs each wave of a [`TaskPlan`] concurrently over a shared
//! [`TextGenerator`]. A task only starts once every task it depends on has
//! produced output, and the first failing wave ends the run.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cpf_evidence::EvidenceRecord;
use cpf_llm::{GenerationRequest, TextGenerator};
use futures::future::join_all;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::obs;
use crate::pipeline::{
    error::{PipelineError, PipelineResult},
    plan::{build_task_plan, standard_tasks, AgentTask, TaskId},
    reply::classify_reply,
    roles::{AgentProfile, AgentRole},
};

/// The multi-agent answer backend used by the orchestrator.
///
/// All-or-nothing: either the final task's text or a typed failure.
#[async_trait]
pub trait AgentPipeline: Send + Sync {
    async fn run(&self, query: &str, evidence: &[EvidenceRecord]) -> PipelineResult<String>;
}

/// Sampling parameters and limits for pipeline stages.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Bound on each stage's model call.
    pub stage_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1500,
            stage_timeout: Duration::from_secs(60),
        }
    }
}

/// Lifecycle of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// What happened to one task during a run.
#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub task_id: TaskId,
    pub role: AgentRole,
    pub state: StageState,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Per-stage trace of one pipeline execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineRun {
    pub stages: Vec<StageRecord>,
}

impl PipelineRun {
    pub fn stage(&self, role: AgentRole) -> Option<&StageRecord> {
        self.stages.iter().find(|s| s.role == role)
    }

    pub fn succeeded(&self) -> bool {
        !self.stages.is_empty()
            && self
                .stages
                .iter()
                .all(|s| s.state == StageState::Succeeded)
    }

    fn set_state(&mut self, id: TaskId, state: StageState) {
        if let Some(stage) = self.stages.iter_mut().find(|s| s.task_id == id) {
            stage.state = state;
        }
    }
}

/// Research → advise → write over a single text generator.
#[derive(Clone)]
pub struct CrewPipeline {
    generator: Arc<dyn TextGenerator>,
    settings: PipelineSettings,
}

impl CrewPipeline {
    pub fn new(generator: Arc<dyn TextGenerator>, settings: PipelineSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run the standard task graph for `query` and return the stage trace
    /// alongside the outcome.
    #[instrument(skip(self, evidence), fields(backend = %self.generator.name(), evidence = evidence.len()))]
    pub async fn execute(
        &self,
        query: &str,
        evidence: &[EvidenceRecord],
    ) -> (PipelineRun, PipelineResult<String>) {
        let plan = match build_task_plan(standard_tasks(query)) {
            Ok(plan) => plan,
            Err(e) => return (PipelineRun::default(), Err(e)),
        };

        let mut run = PipelineRun {
            stages: plan
                .tasks()
                .map(|t| StageRecord {
                    task_id: t.id,
                    role: t.role,
                    state: StageState::Pending,
                    duration_ms: 0,
                    error: None,
                })
                .collect(),
        };
        let mut outputs: BTreeMap<TaskId, String> = BTreeMap::new();

        for wave in plan.waves() {
            let tasks: Vec<&AgentTask> = wave.iter().filter_map(|id| plan.task(*id)).collect();
            for task in &tasks {
                run.set_state(task.id, StageState::Running);
            }

            let results = join_all(tasks.iter().map(|task| {
                let upstream: Vec<(AgentRole, &str)> = task
                    .dependencies
                    .iter()
                    .filter_map(|dep| {
                        let role = plan.task(*dep)?.role;
                        outputs.get(dep).map(|out| (role, out.as_str()))
                    })
                    .collect();
                self.run_stage(task, upstream, evidence)
            }))
            .await;

            let mut first_error = None;
            for (task, (result, duration_ms)) in tasks.iter().zip(results) {
                if let Some(stage) = run.stages.iter_mut().find(|s| s.task_id == task.id) {
                    stage.duration_ms = duration_ms;
                    match &result {
                        Ok(_) => stage.state = StageState::Succeeded,
                        Err(e) => {
                            stage.state = StageState::Failed;
                            stage.error = Some(e.to_string());
                        }
                    }
                }
                match result {
                    Ok(text) => {
                        outputs.insert(task.id, text);
                    }
                    Err(e) => {
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                }
            }

            if let Some(e) = first_error {
                return (run, Err(e));
            }
        }

        let final_id = plan.final_task().id;
        match outputs.remove(&final_id) {
            Some(answer) => (run, Ok(answer)),
            None => (
                run,
                Err(PipelineError::InvalidPlan {
                    reason: format!("final task {final_id} produced no output"),
                }),
            ),
        }
    }

    async fn run_stage(
        &self,
        task: &AgentTask,
        upstream: Vec<(AgentRole, &str)>,
        evidence: &[EvidenceRecord],
    ) -> (PipelineResult<String>, u64) {
        let profile = AgentProfile::for_role(task.role);
        let role_name = task.role.to_string();
        obs::emit_stage_started(&role_name, task.id.0);
        let started = Instant::now();

        let request = GenerationRequest::new(profile.system_prompt())
            .with_user(stage_prompt(task, &upstream, evidence))
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);

        let result = match tokio::time::timeout(
            self.settings.stage_timeout,
            self.generator.generate(request),
        )
        .await
        {
            Err(_) => Err(PipelineError::StageTimeout {
                role: task.role,
                timeout_ms: self.settings.stage_timeout.as_millis() as u64,
            }),
            Ok(Err(source)) => Err(PipelineError::Backend {
                role: task.role,
                source,
            }),
            Ok(Ok(reply)) => classify_reply(&reply)
                .map(str::to_string)
                .map_err(|reason| PipelineError::StageRejected {
                    role: task.role,
                    reason,
                }),
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(text) => debug!(role = %task.role, chars = text.len(), "stage produced output"),
            Err(e) => warn!(role = %task.role, error = %e, "stage failed"),
        }
        obs::emit_stage_finished(&role_name, duration_ms, result.is_ok());
        (result, duration_ms)
    }
}

#[async_trait]
impl AgentPipeline for CrewPipeline {
    async fn run(&self, query: &str, evidence: &[EvidenceRecord]) -> PipelineResult<String> {
        self.execute(query, evidence).await.1
    }
}

/// User message for one stage.
///
/// Root tasks see the evidence; dependent tasks see their upstream outputs.
fn stage_prompt(task: &AgentTask, upstream: &[(AgentRole, &str)], evidence: &[EvidenceRecord]) -> String {
    let mut prompt = task.description.clone();

    if task.dependencies.is_empty() {
        prompt.push_str("\n\nReference material from official CPF sources:\n\n");
        if evidence.is_empty() {
            prompt.push_str(
                "(No reference pages could be retrieved. State clearly which points \
                 could not be verified against official sources.)",
            );
        } else {
            let blocks: Vec<String> = evidence
                .iter()
                .map(|r| format!("Source: {}\n{}", r.url, r.content))
                .collect();
            prompt.push_str(&blocks.join("\n\n"));
        }
    }

    if !upstream.is_empty() {
        prompt.push_str("\n\nContext from earlier tasks:");
        for (role, output) in upstream {
            let title = AgentProfile::for_role(*role).title;
            prompt.push_str(&format!("\n\n### {title}\n{output}"));
        }
    }

    prompt
}
