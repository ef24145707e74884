//! Request orchestration: gate → evidence → pipeline → fallback → answer.
//!
//! [`Orchestrator::answer`] never fails: every query resolves to exactly one
//! [`Answer`] variant, and panics inside the pipeline or fallback are caught
//! at task boundaries and treated as failures.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use cpf_evidence::{EvidenceAssembler, EvidenceRecord, PageFetcher, ReferenceCatalog};
use cpf_llm::TextGenerator;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{warn, Instrument};
use uuid::Uuid;

use crate::answer::Answer;
use crate::config::AdvisorConfig;
use crate::error::AdvisorResult;
use crate::fallback::{evidence_context, FallbackError, FallbackResponder};
use crate::gate::DomainGate;
use crate::obs;
use crate::pipeline::{AgentPipeline, CrewPipeline, PipelineError};
use crate::session::Session;

/// Default deadline for one request end to end.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Routes a query through the answer paths in order of preference.
pub struct Orchestrator {
    gate: DomainGate,
    catalog: Arc<ReferenceCatalog>,
    assembler: EvidenceAssembler,
    pipeline: Arc<dyn AgentPipeline>,
    fallback: Arc<FallbackResponder>,
    request_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        gate: DomainGate,
        catalog: ReferenceCatalog,
        assembler: EvidenceAssembler,
        pipeline: Arc<dyn AgentPipeline>,
        fallback: FallbackResponder,
    ) -> Self {
        Self {
            gate,
            catalog: Arc::new(catalog),
            assembler,
            pipeline,
            fallback: Arc::new(fallback),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Wire the standard components from `config`.
    ///
    /// The pipeline and the fallback share `generator`.
    pub fn from_config(
        config: &AdvisorConfig,
        fetcher: Arc<dyn PageFetcher>,
        generator: Arc<dyn TextGenerator>,
    ) -> AdvisorResult<Self> {
        config.validate()?;
        let pipeline = CrewPipeline::new(Arc::clone(&generator), config.pipeline_settings());
        let fallback = FallbackResponder::new(generator, config.fallback_settings());
        Ok(Self::new(
            config.domain_gate()?,
            config.reference_catalog()?,
            EvidenceAssembler::new(fetcher, config.gather_config()),
            Arc::new(pipeline),
            fallback,
        )
        .with_request_timeout(config.request_timeout()))
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    pub fn gate(&self) -> &DomainGate {
        &self.gate
    }

    /// Handle one query and return the typed outcome.
    pub async fn answer(&self, query: &str) -> Answer {
        let span = obs::request_span(Uuid::new_v4());
        self.answer_in_span(query).instrument(span).await
    }

    /// Handle one query and return the rendered text. Never empty.
    pub async fn handle(&self, query: &str) -> String {
        self.answer(query).await.render()
    }

    /// [`handle`](Self::handle), then append the exchange to `session`.
    pub async fn handle_in_session(&self, session: &mut Session, query: &str) -> String {
        let text = self.handle(query).await;
        session.record(query, text.clone());
        text
    }

    async fn answer_in_span(&self, query: &str) -> Answer {
        let started = Instant::now();
        obs::emit_query_received(query);

        let answer = if !self.gate.is_in_domain(query) {
            obs::emit_query_rejected(query);
            Answer::Refused
        } else {
            let deadline = started + self.request_timeout;
            match tokio::time::timeout_at(deadline, self.route(query, deadline)).await {
                Ok(answer) => answer,
                Err(_) => {
                    warn!(
                        timeout_secs = self.request_timeout.as_secs(),
                        "request deadline expired"
                    );
                    Answer::Failed {
                        reason: format!(
                            "request timed out after {}s",
                            self.request_timeout.as_secs()
                        ),
                    }
                }
            }
        };

        obs::emit_answer_returned(
            answer.kind(),
            answer.sources().len(),
            started.elapsed().as_millis() as u64,
        );
        answer
    }

    async fn route(&self, query: &str, deadline: Instant) -> Answer {
        let urls = self.catalog.select_urls(query);
        obs::emit_sources_selected(urls.len(), urls.is_fallback());

        let report = self.assembler.gather_report(&urls).await;
        obs::emit_evidence_gathered(report.records.len(), report.failures.len(), report.timed_out);

        let evidence = Arc::new(report.records);
        let sources: Vec<String> = evidence.iter().map(|r| r.url.clone()).collect();

        match self.run_pipeline(query, Arc::clone(&evidence), deadline).await {
            Ok(text) => Answer::Analysis { text, sources },
            Err(e) => {
                obs::emit_pipeline_failed(&e);
                let context = evidence_context(&evidence);
                obs::emit_fallback_engaged(context.len());
                match self.run_fallback(query, context).await {
                    Ok(text) => Answer::Fallback { text, sources },
                    Err(e) => {
                        obs::emit_fallback_failed(&e);
                        Answer::Failed {
                            reason: e.to_string(),
                        }
                    }
                }
            }
        }
    }

    /// Run the pipeline in its own task. It must finish early enough to
    /// leave the fallback its full timeout before `deadline`.
    async fn run_pipeline(
        &self,
        query: &str,
        evidence: Arc<Vec<EvidenceRecord>>,
        deadline: Instant,
    ) -> Result<String, PipelineError> {
        let budget = pipeline_budget(deadline, Instant::now(), self.fallback.settings().timeout);
        let pipeline = Arc::clone(&self.pipeline);
        let query = query.to_string();
        let task = AbortOnDrop(tokio::spawn(
            async move { pipeline.run(&query, &evidence).await }.in_current_span(),
        ));
        match tokio::time::timeout(budget, task.join()).await {
            Ok(joined) => {
                joined.unwrap_or_else(|e| Err(PipelineError::Panicked(join_error_message(e))))
            }
            Err(_) => Err(PipelineError::Timeout(budget.as_millis() as u64)),
        }
    }

    async fn run_fallback(&self, query: &str, context: String) -> Result<String, FallbackError> {
        let fallback = Arc::clone(&self.fallback);
        let query = query.to_string();
        let task = AbortOnDrop(tokio::spawn(
            async move { fallback.try_respond(&query, &context).await }.in_current_span(),
        ));
        task.join()
            .await
            .unwrap_or_else(|e| Err(FallbackError::Panicked(join_error_message(e))))
    }
}

/// Time left for the pipeline once the fallback's share is set aside.
fn pipeline_budget(deadline: Instant, now: Instant, fallback_timeout: Duration) -> Duration {
    deadline
        .saturating_duration_since(now)
        .saturating_sub(fallback_timeout)
}

/// Aborts the task if the request is abandoned before it finishes.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> AbortOnDrop<T> {
    async fn join(mut self) -> Result<T, JoinError> {
        (&mut self.0).await
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn join_error_message(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic())
    } else {
        "task was cancelled".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_join_error_message_extracts_panic_text() {
        let err = tokio::spawn(async { panic!("stage exploded") })
            .await
            .unwrap_err();
        assert_eq!(join_error_message(err), "stage exploded");

        let err = tokio::spawn(async { panic!("{} exploded", "writer") })
            .await
            .unwrap_err();
        assert_eq!(join_error_message(err), "writer exploded");
    }

    #[tokio::test]
    async fn test_pipeline_budget_reserves_fallback_share() {
        let now = Instant::now();
        let fallback = Duration::from_secs(60);

        assert_eq!(
            pipeline_budget(now + Duration::from_secs(170), now, fallback),
            Duration::from_secs(110)
        );
        assert_eq!(
            pipeline_budget(now + Duration::from_secs(30), now, fallback),
            Duration::ZERO
        );
        assert_eq!(pipeline_budget(now, now + Duration::from_secs(5), fallback), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_abort_on_drop_cancels_task() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let task = AbortOnDrop(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            let _ = tx.send(());
        }));
        drop(task);
        assert!(rx.await.is_err());
    }
}
