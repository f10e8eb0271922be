//! Per-batch orchestration — the attempt loop that turns one batch into
//! weeks, degrading to templates instead of failing.
//!
//! Per batch: compose the prompt (role context + batch boundaries + sliding
//! window), send it on the shared session, parse. A transient provider
//! failure or a parse failure consumes an attempt and loops back after
//! backoff; a non-transient failure stops immediately. When attempts run out
//! the batch is built from fallback templates and flagged degraded — the
//! roadmap as a whole never aborts here.

use tracing::{info, warn};

use crate::generation::context_window::ContextWindow;
use crate::generation::fallback::{build_fallback_week, build_fallback_weeks};
use crate::generation::parser::{parse_batch, BatchOutcome, ParsedBatch};
use crate::generation::planner::Batch;
use crate::llm_client::prompts::build_batch_prompt;
use crate::llm_client::{ChatSession, ProviderError};
use crate::models::roadmap::{RoleContext, Week};
use crate::retry::RetryPolicy;

/// What one batch produced.
#[derive(Debug)]
pub struct BatchResult {
    /// Exactly `batch.week_count()` weeks covering the batch range, ascending.
    pub weeks: Vec<Week>,
    /// How many of those weeks came from genuine generation.
    pub genuine_week_count: usize,
    /// True when any week came from the fallback builder.
    pub was_degraded: bool,
    /// Artifact-level hints the model offered (first batch, typically).
    pub title_hint: Option<String>,
    pub description_hint: Option<String>,
    /// Set when a non-transient provider failure ended the attempts; the
    /// assembler's first-batch policy decides whether it surfaces.
    pub fatal: Option<ProviderError>,
}

/// Runs the attempt loop for one batch. Total: always returns a full
/// batch-worth of weeks, falling back to templates when generation degrades.
pub async fn run_batch(
    session: &mut dyn ChatSession,
    batch: &Batch,
    window: &ContextWindow,
    role: &RoleContext,
    retry: &RetryPolicy,
) -> BatchResult {
    let prompt = build_batch_prompt(batch, role, window);
    let mut fatal: Option<ProviderError> = None;

    for attempt in 0..retry.max_attempts {
        if attempt > 0 {
            let delay = retry.delay_for(attempt);
            warn!(
                "batch {}-{}: attempt {} failed, retrying after {}ms",
                batch.start_week,
                batch.end_week,
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        let outcome = match session.send(&prompt).await {
            Ok(raw) => parse_batch(&raw, batch),
            Err(e) => BatchOutcome::Provider(e),
        };

        match outcome {
            BatchOutcome::Success(parsed) => {
                return resolve_success(parsed, batch, role);
            }
            BatchOutcome::ParseFailure { detail } => {
                warn!("batch {}-{}: parse failure: {detail}", batch.start_week, batch.end_week);
                continue;
            }
            BatchOutcome::Provider(e) if e.is_transient() => {
                warn!("batch {}-{}: transient provider failure: {e}", batch.start_week, batch.end_week);
                continue;
            }
            BatchOutcome::Provider(e) => {
                warn!("batch {}-{}: non-transient provider failure: {e}", batch.start_week, batch.end_week);
                fatal = Some(e);
                break;
            }
        }
    }

    info!(
        "batch {}-{}: generation exhausted, degrading to fallback",
        batch.start_week, batch.end_week
    );
    BatchResult {
        weeks: build_fallback_weeks(batch, role),
        genuine_week_count: 0,
        was_degraded: true,
        title_hint: None,
        description_hint: None,
        fatal,
    }
}

/// Completes a successful parse into a full batch-worth of weeks: any week
/// numbers the model skipped are filled from templates and the batch is
/// marked degraded.
fn resolve_success(parsed: ParsedBatch, batch: &Batch, role: &RoleContext) -> BatchResult {
    let genuine_week_count = parsed.weeks.len();
    let mut weeks = parsed.weeks;
    let mut filled = 0usize;

    for number in batch.week_numbers() {
        if !weeks.iter().any(|w| w.number == number) {
            warn!("batch {}-{}: week {number} missing from payload, filling from fallback",
                batch.start_week, batch.end_week);
            weeks.push(build_fallback_week(number, role));
            filled += 1;
        }
    }
    weeks.sort_by_key(|w| w.number);

    BatchResult {
        weeks,
        genuine_week_count,
        was_degraded: filled > 0,
        title_hint: parsed.title_hint,
        description_hint: parsed.description_hint,
        fatal: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::testing::{weeks_json, ScriptedSession};

    fn role() -> RoleContext {
        RoleContext::for_role("backend developer")
    }

    #[tokio::test]
    async fn test_clean_success_is_not_degraded() {
        let batch = Batch { start_week: 1, end_week: 3 };
        let mut session = ScriptedSession::new(vec![Ok(weeks_json(1..=3))]);
        let result = run_batch(
            &mut session,
            &batch,
            &ContextWindow::empty(),
            &role(),
            &RetryPolicy::zeroed(),
        )
        .await;
        assert!(!result.was_degraded);
        assert_eq!(result.genuine_week_count, 3);
        assert_eq!(result.weeks.len(), 3);
        assert!(result.fatal.is_none());
        assert_eq!(session.sent_prompts.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_then_valid_recovers_within_attempts() {
        let batch = Batch { start_week: 4, end_week: 6 };
        let mut session = ScriptedSession::new(vec![
            Ok("sorry, no JSON today".to_string()),
            Ok(weeks_json(4..=6)),
        ]);
        let result = run_batch(
            &mut session,
            &batch,
            &ContextWindow::empty(),
            &role(),
            &RetryPolicy::zeroed(),
        )
        .await;
        assert!(!result.was_degraded);
        assert_eq!(session.sent_prompts.len(), 2);
    }

    #[tokio::test]
    async fn test_persistent_malformed_output_degrades_to_fallback() {
        let batch = Batch { start_week: 7, end_week: 9 };
        let mut session = ScriptedSession::new(vec![
            Ok("not json".to_string()),
            Ok("still not json".to_string()),
            Ok("never json".to_string()),
        ]);
        let result = run_batch(
            &mut session,
            &batch,
            &ContextWindow::empty(),
            &role(),
            &RetryPolicy::zeroed(),
        )
        .await;
        assert!(result.was_degraded);
        assert_eq!(result.genuine_week_count, 0);
        assert_eq!(result.weeks.len(), 3);
        assert_eq!(
            result.weeks.iter().map(|w| w.number).collect::<Vec<_>>(),
            vec![7, 8, 9]
        );
        assert!(result.fatal.is_none());
    }

    #[tokio::test]
    async fn test_transient_failures_retry_then_degrade() {
        let batch = Batch { start_week: 1, end_week: 2 };
        let mut session = ScriptedSession::new(vec![
            Err(ProviderError::RateLimited),
            Err(ProviderError::Timeout),
            Err(ProviderError::Upstream { status: 503, message: "down".to_string() }),
        ]);
        let result = run_batch(
            &mut session,
            &batch,
            &ContextWindow::empty(),
            &role(),
            &RetryPolicy::zeroed(),
        )
        .await;
        assert!(result.was_degraded);
        assert!(result.fatal.is_none());
        assert_eq!(session.sent_prompts.len(), 3);
    }

    #[tokio::test]
    async fn test_non_transient_failure_stops_immediately_and_records_fatal() {
        let batch = Batch { start_week: 1, end_week: 3 };
        let mut session = ScriptedSession::new(vec![
            Err(ProviderError::AuthFailure),
            Ok(weeks_json(1..=3)), // must never be reached
        ]);
        let result = run_batch(
            &mut session,
            &batch,
            &ContextWindow::empty(),
            &role(),
            &RetryPolicy::zeroed(),
        )
        .await;
        assert!(result.was_degraded);
        assert!(matches!(result.fatal, Some(ProviderError::AuthFailure)));
        assert_eq!(session.sent_prompts.len(), 1);
        assert_eq!(result.weeks.len(), 3);
    }

    #[tokio::test]
    async fn test_partial_coverage_is_filled_and_marked_degraded() {
        let batch = Batch { start_week: 4, end_week: 6 };
        // Model only returns weeks 4 and 6; week 5 must be template-filled.
        let payload = serde_json::json!({
            "weeks": [
                serde_json::from_str::<serde_json::Value>(&weeks_json(4..=4)).unwrap()["weeks"][0],
                serde_json::from_str::<serde_json::Value>(&weeks_json(6..=6)).unwrap()["weeks"][0]
            ]
        })
        .to_string();
        let mut session = ScriptedSession::new(vec![Ok(payload)]);
        let result = run_batch(
            &mut session,
            &batch,
            &ContextWindow::empty(),
            &role(),
            &RetryPolicy::zeroed(),
        )
        .await;
        assert!(result.was_degraded);
        assert_eq!(result.genuine_week_count, 2);
        assert_eq!(
            result.weeks.iter().map(|w| w.number).collect::<Vec<_>>(),
            vec![4, 5, 6]
        );
    }

    #[tokio::test]
    async fn test_continuation_batches_use_the_window_fragment() {
        let batch = Batch { start_week: 4, end_week: 6 };
        let previous = vec![crate::models::roadmap::Week {
            number: 3,
            focus_area: "Core Concepts".to_string(),
            learning_objectives: vec![],
            days: vec![],
        }];
        let window = crate::generation::context_window::extract(&previous, 2);
        let mut session = ScriptedSession::new(vec![Ok(weeks_json(4..=6))]);
        let _ = run_batch(&mut session, &batch, &window, &role(), &RetryPolicy::zeroed()).await;
        assert!(session.sent_prompts[0].contains("ends at week 3"));
        assert!(!session.sent_prompts[0].contains("User Profile"));
    }
}
