//! Task decomposition and dependency ordering.
//!
//! Validates a proposed set of [`AgentTask`]s and builds a [`TaskPlan`] whose
//! waves respect every dependency edge.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::pipeline::{
    error::{PipelineError, PipelineResult},
    roles::AgentRole,
};

/// Identifier of a task within one plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub usize);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A unit of work assigned to one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTask {
    pub id: TaskId,
    pub role: AgentRole,
    pub description: String,
    /// Tasks whose output this task receives as context.
    pub dependencies: Vec<TaskId>,
}

/// Research, advise and write tasks for `query`.
///
/// Research has no dependencies, advise depends on research, and write
/// depends on both.
pub fn standard_tasks(query: &str) -> Vec<AgentTask> {
    vec![
        AgentTask {
            id: TaskId(0),
            role: AgentRole::Researcher,
            description: format!(
                "1. Research the specific CPF housing query: {query}\n\
                 2. Identify relevant CPF policies and guidelines\n\
                 3. Gather supporting information from official CPF sources"
            ),
            dependencies: vec![],
        },
        AgentTask {
            id: TaskId(1),
            role: AgentRole::Advisor,
            description: format!(
                "1. Analyze the research findings for the query: {query}\n\
                 2. Validate information accuracy\n\
                 3. Identify key points that address the user's question"
            ),
            dependencies: vec![TaskId(0)],
        },
        AgentTask {
            id: TaskId(2),
            role: AgentRole::Writer,
            description: format!(
                "1. Create a clear and comprehensive response to: {query}\n\
                 2. Include relevant policy details and practical implications\n\
                 3. Structure the response for easy understanding"
            ),
            dependencies: vec![TaskId(0), TaskId(1)],
        },
    ]
}

/// A validated task graph partitioned into dependency waves.
#[derive(Debug, Clone)]
pub struct TaskPlan {
    tasks: BTreeMap<TaskId, AgentTask>,
    waves: Vec<Vec<TaskId>>,
    final_task: TaskId,
}

impl TaskPlan {
    /// Groups of tasks that may run concurrently, in execution order.
    ///
    /// Every dependency of a task in wave `n` belongs to a wave before `n`.
    pub fn waves(&self) -> &[Vec<TaskId>] {
        &self.waves
    }

    pub fn task(&self, id: TaskId) -> Option<&AgentTask> {
        self.tasks.get(&id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &AgentTask> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The single task nothing depends on; its output is the pipeline's answer.
    pub fn final_task(&self) -> &AgentTask {
        &self.tasks[&self.final_task]
    }
}

/// Build a [`TaskPlan`] from `tasks`.
///
/// Rejects an empty list, duplicate ids, dependencies on unknown tasks, cycles,
/// and graphs without exactly one sink task.
pub fn build_task_plan(tasks: Vec<AgentTask>) -> PipelineResult<TaskPlan> {
    if tasks.is_empty() {
        return Err(PipelineError::EmptyPlan);
    }

    let mut by_id = BTreeMap::new();
    for task in tasks {
        let id = task.id;
        if by_id.insert(id, task).is_some() {
            return Err(PipelineError::DuplicateTask(id));
        }
    }

    for task in by_id.values() {
        for dep in &task.dependencies {
            if !by_id.contains_key(dep) {
                return Err(PipelineError::UnknownDependency {
                    task: task.id,
                    dependency: *dep,
                });
            }
            if *dep == task.id {
                return Err(PipelineError::CyclicDependencies);
            }
        }
    }

    // Kahn's algorithm, one wave at a time.
    let mut remaining: BTreeMap<TaskId, BTreeSet<TaskId>> = by_id
        .values()
        .map(|t| (t.id, t.dependencies.iter().copied().collect()))
        .collect();
    let mut waves = Vec::new();
    while !remaining.is_empty() {
        let ready: Vec<TaskId> = remaining
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(id, _)| *id)
            .collect();
        if ready.is_empty() {
            return Err(PipelineError::CyclicDependencies);
        }
        for id in &ready {
            remaining.remove(id);
        }
        for deps in remaining.values_mut() {
            for id in &ready {
                deps.remove(id);
            }
        }
        waves.push(ready);
    }

    let depended_on: BTreeSet<TaskId> = by_id
        .values()
        .flat_map(|t| t.dependencies.iter().copied())
        .collect();
    let sinks: Vec<TaskId> = by_id
        .keys()
        .filter(|id| !depended_on.contains(id))
        .copied()
        .collect();
    let final_task = match sinks.as_slice() {
        [only] => *only,
        _ => {
            return Err(PipelineError::InvalidPlan {
                reason: format!("expected exactly one final task, found {}", sinks.len()),
            })
        }
    };

    Ok(TaskPlan {
        tasks: by_id,
        waves,
        final_task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: usize, role: AgentRole, deps: &[usize]) -> AgentTask {
        AgentTask {
            id: TaskId(id),
            role,
            description: format!("task {id}"),
            dependencies: deps.iter().map(|d| TaskId(*d)).collect(),
        }
    }

    #[test]
    fn test_standard_tasks_form_three_sequential_waves() {
        let plan = build_task_plan(standard_tasks("cpf loan")).unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(
            plan.waves(),
            &[vec![TaskId(0)], vec![TaskId(1)], vec![TaskId(2)]]
        );
        assert_eq!(plan.final_task().role, AgentRole::Writer);
    }

    #[test]
    fn test_standard_task_descriptions_embed_query() {
        for t in standard_tasks("how does bto grant work") {
            assert!(t.description.contains("how does bto grant work"));
        }
    }

    #[test]
    fn test_independent_tasks_share_a_wave() {
        let plan = build_task_plan(vec![
            task(0, AgentRole::Researcher, &[]),
            task(1, AgentRole::Advisor, &[]),
            task(2, AgentRole::Writer, &[0, 1]),
        ])
        .unwrap();
        assert_eq!(plan.waves().len(), 2);
        assert_eq!(plan.waves()[0], vec![TaskId(0), TaskId(1)]);
    }

    #[test]
    fn test_empty_plan_is_rejected() {
        assert!(matches!(
            build_task_plan(vec![]).unwrap_err(),
            PipelineError::EmptyPlan
        ));
    }

    #[test]
    fn test_duplicate_task_is_rejected() {
        let err = build_task_plan(vec![
            task(0, AgentRole::Researcher, &[]),
            task(0, AgentRole::Writer, &[]),
        ])
        .unwrap_err();
        match err {
            PipelineError::DuplicateTask(id) => assert_eq!(id, TaskId(0)),
            other => panic!("Expected DuplicateTask, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_dependency_is_rejected() {
        let err = build_task_plan(vec![task(0, AgentRole::Writer, &[7])]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnknownDependency {
                task: TaskId(0),
                dependency: TaskId(7)
            }
        ));
    }

    #[test]
    fn test_cycle_is_rejected() {
        let err = build_task_plan(vec![
            task(0, AgentRole::Researcher, &[2]),
            task(1, AgentRole::Advisor, &[0]),
            task(2, AgentRole::Writer, &[1]),
        ])
        .unwrap_err();
        assert!(matches!(err, PipelineError::CyclicDependencies));
    }

    #[test]
    fn test_two_final_tasks_are_rejected() {
        let err = build_task_plan(vec![
            task(0, AgentRole::Researcher, &[]),
            task(1, AgentRole::Advisor, &[0]),
            task(2, AgentRole::Writer, &[0]),
        ])
        .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidPlan { .. }));
    }

    #[test]
    fn test_single_task_plan_is_valid() {
        let plan = build_task_plan(vec![task(0, AgentRole::Writer, &[])]).unwrap();
        assert_eq!(plan.waves().len(), 1);
        assert_eq!(plan.final_task().id, TaskId(0));
    }
}
