//! Structured lifecycle events for advisor requests.
//!
//! Every request runs inside a [`request_span`]; the `emit_*` functions log one
//! event each with a stable `event` field. Events are emitted at `info!`
//! unless noted (filter with `CPF_ADVISOR_LOG`).

use tracing::{info, warn};
use uuid::Uuid;

/// Span carrying `request_id`; the orchestrator instruments each request future with it.
pub fn request_span(request_id: Uuid) -> tracing::Span {
    tracing::info_span!("cpf.request", request_id = %request_id)
}

/// Emit event: a query arrived; only its length is logged.
///
/// # Example
///
/// ```ignore
/// emit_query_received("how does cpf housing loan interest work");
/// // logs: event=query.received query_chars=39
/// ```
pub fn emit_query_received(query: &str) {
    info!(event = "query.received", query_chars = query.chars().count());
}

/// Emit event: the domain gate refused the query.
pub fn emit_query_rejected(query: &str) {
    info!(event = "query.rejected", query = %query, reason = "out_of_domain");
}

/// Emit event: reference URLs chosen, and whether the `general_info` fallback was used.
pub fn emit_sources_selected(count: usize, fallback: bool) {
    info!(event = "sources.selected", count = count, general_info_fallback = fallback);
}

/// Emit event: evidence gathering finished; `failed` counts fetch errors, `timed_out` the deadline.
pub fn emit_evidence_gathered(records: usize, failed: usize, timed_out: bool) {
    info!(
        event = "evidence.gathered",
        records = records,
        failed = failed,
        timed_out = timed_out,
    );
}

/// Emit event: an agent stage began.
pub fn emit_stage_started(role: &str, task_id: usize) {
    info!(event = "stage.started", role = %role, task_id = task_id);
}

/// Emit event: an agent stage ended with duration and success status.
pub fn emit_stage_finished(role: &str, duration_ms: u64, success: bool) {
    info!(
        event = "stage.finished",
        role = %role,
        duration_ms = duration_ms,
        success = success,
    );
}

/// Emit event: pipeline failure (warning level).
pub fn emit_pipeline_failed(error: &dyn std::fmt::Display) {
    warn!(event = "pipeline.failed", error = %error);
}

/// Emit event: the single-call fallback is about to run.
pub fn emit_fallback_engaged(context_chars: usize) {
    info!(event = "fallback.engaged", context_chars = context_chars);
}

/// Emit event: fallback failure (warning level).
pub fn emit_fallback_failed(error: &dyn std::fmt::Display) {
    warn!(event = "fallback.failed", error = %error);
}

/// Emit event: the request resolved to an answer of `kind`.
pub fn emit_answer_returned(kind: &str, sources: usize, duration_ms: u64) {
    info!(
        event = "answer.returned",
        kind = %kind,
        sources = sources,
        duration_ms = duration_ms,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_span_and_events_do_not_panic_without_subscriber() {
        let span = request_span(Uuid::new_v4());
        let _guard = span.enter();
        emit_query_received("cpf housing loan");
        emit_pipeline_failed(&"writer stage produced an unusable reply");
        emit_answer_returned("fallback", 2, 15);
    }
}
