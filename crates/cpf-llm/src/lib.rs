//! CPF-LLM: the text-generation capability behind the CPF advisor
//!
//! The reasoning layers only ever see [`TextGenerator`]: "given an
//! instruction and a conversation, produce text". This crate provides that
//! trait, an OpenAI-compatible implementation, and a scripted fake.
//!
//! ## Layer 2 - Generation
//!
//! Focus: typed failures; no interpretation of what the model said.

pub mod error;
pub mod fakes;
pub mod generator;
pub mod openai;

pub use error::{LlmError, LlmResult};
pub use generator::{ChatMessage, ChatRole, GenerationRequest, TextGenerator};
pub use openai::{
    OpenAiClient, OpenAiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, OPENAI_API_KEY_VAR,
    OPENAI_BASE_URL_VAR, OPENAI_MODEL_VAR,
};
