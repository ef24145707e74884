//! Core role vocabulary: `AgentRole` and `AgentProfile`.

use serde::{Deserialize, Serialize};

/// The three agents of the answer pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Researcher,
    Advisor,
    Writer,
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AgentRole::Researcher => "researcher",
            AgentRole::Advisor => "advisor",
            AgentRole::Writer => "writer",
        };
        write!(f, "{s}")
    }
}

/// Static persona for one role: title, goal and backstory.
///
/// Profiles do not execute; the executor turns them into a system instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfile {
    pub role: AgentRole,
    pub title: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
}

impl AgentProfile {
    /// The research analyst, housing advisor and content writer, in pipeline order.
    pub fn standard_crew() -> Vec<AgentProfile> {
        vec![
            AgentProfile {
                role: AgentRole::Researcher,
                title: "CPF Research Analyst",
                goal: "Conduct thorough research on CPF housing queries using official CPF sources",
                backstory: "You're a specialized researcher focusing on CPF housing policies and \
                            regulations. You have access to the latest CPF housing information and \
                            can analyze complex policy details. You always verify information from \
                            official CPF sources and provide accurate, up-to-date information.",
            },
            AgentProfile {
                role: AgentRole::Advisor,
                title: "CPF Housing Advisor",
                goal: "Provide clear and accurate CPF housing advice",
                backstory: "You're an experienced CPF housing advisor who explains complex \
                            policies in simple terms. You ensure all advice is accurate and \
                            helpful for decision-making.",
            },
            AgentProfile {
                role: AgentRole::Writer,
                title: "Content Writer",
                goal: "Create clear and comprehensive responses to CPF housing queries",
                backstory: "You're a specialized writer who transforms complex CPF housing \
                            information into clear, concise, and user-friendly responses.",
            },
        ]
    }

    pub fn for_role(role: AgentRole) -> AgentProfile {
        match role {
            AgentRole::Researcher => Self::standard_crew().swap_remove(0),
            AgentRole::Advisor => Self::standard_crew().swap_remove(1),
            AgentRole::Writer => Self::standard_crew().swap_remove(2),
        }
    }

    /// System instruction sent with every call this agent makes.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are the {}.\n\nGoal: {}\n\nBackground: {}",
            self.title, self.goal, self.backstory
        )
    }
}
