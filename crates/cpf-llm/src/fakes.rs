//! Scripted text generator (testing only)
//!
//! `ScriptedGenerator` replays a queue of canned outcomes and captures every
//! request it receives. When the script runs dry it keeps answering with the
//! configured default outcome.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{LlmError, LlmResult};
use crate::generator::{GenerationRequest, TextGenerator};

/// One canned outcome.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Return this text.
    Reply(String),
    /// Fail with an HTTP-style backend error carrying this message.
    Fail(String),
    /// Sleep, then return this text.
    Delayed(Duration, String),
    /// Panic with this message.
    Panic(String),
}

/// Generator backed by a FIFO of [`Scripted`] outcomes.
#[derive(Debug)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Scripted>>,
    exhausted: Scripted,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            exhausted: Scripted::Fail("script exhausted".to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator that answers every call with `text`.
    pub fn always(text: &str) -> Self {
        Self::default().when_exhausted(Scripted::Reply(text.to_string()))
    }

    /// A generator whose every call fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self::default().when_exhausted(Scripted::Fail(message.to_string()))
    }

    pub fn then_reply(self, text: &str) -> Self {
        self.then(Scripted::Reply(text.to_string()))
    }

    pub fn then_fail(self, message: &str) -> Self {
        self.then(Scripted::Fail(message.to_string()))
    }

    pub fn then(self, outcome: Scripted) -> Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    /// Outcome used once the script is empty.
    pub fn when_exhausted(mut self, outcome: Scripted) -> Self {
        self.exhausted = outcome;
        self
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest) -> LlmResult<String> {
        self.requests.lock().unwrap().push(request);
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.exhausted.clone());

        match outcome {
            Scripted::Reply(text) => Ok(text),
            Scripted::Fail(message) => Err(LlmError::Status {
                status: 500,
                message,
            }),
            Scripted::Delayed(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            Scripted::Panic(message) => panic!("{message}"),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
