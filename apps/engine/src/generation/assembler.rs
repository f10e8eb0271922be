//! Roadmap assembly — the engine's entry point.
//!
//! Flow: plan batches once → open one provider session → for each batch in
//! ascending order, run the orchestrator with the sliding context window
//! derived from the previous batch → validate the assembled whole → stamp
//! status, dates, and completion bookkeeping.
//!
//! Batches are strictly sequential: each prompt is primed by the tail of the
//! previous batch's output, so there is nothing to parallelize inside one
//! assembly. Cancellation is dropping the future; the session lives on this
//! stack and is dropped with it, and no partially assembled roadmap escapes.

use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::config::{EngineConfig, FirstBatchFailurePolicy};
use crate::errors::EngineError;
use crate::generation::context_window::{extract, ContextWindow};
use crate::generation::orchestrator::run_batch;
use crate::generation::planner::plan_batches;
use crate::llm_client::prompts::ROADMAP_SYSTEM;
use crate::llm_client::{ChatSession, LlmClient};
use crate::models::roadmap::{Roadmap, RoadmapStatus, RoleContext, Week};

/// Assembles a full roadmap by driving batched generation over one provider
/// session.
///
/// The caller always receives either a complete-or-degraded roadmap or a
/// hard error limited to planning mistakes, invariant violations, or (under
/// the default first-batch policy) a non-transient provider failure before
/// any content existed.
pub async fn assemble(
    llm: &LlmClient,
    total_weeks: u32,
    role: &RoleContext,
    config: &EngineConfig,
) -> Result<Roadmap, EngineError> {
    let mut session = llm.open_session(ROADMAP_SYSTEM);
    assemble_with_session(&mut session, total_weeks, role, config).await
}

/// Assembly over a caller-supplied session. Split out so tests drive the
/// engine with a scripted session instead of a live provider.
pub async fn assemble_with_session(
    session: &mut dyn ChatSession,
    total_weeks: u32,
    role: &RoleContext,
    config: &EngineConfig,
) -> Result<Roadmap, EngineError> {
    info!(
        "assembling {total_weeks}-week roadmap for role '{}' ({} weeks/batch)",
        role.target_role, config.weeks_per_batch
    );

    let batches = plan_batches(total_weeks, config.weeks_per_batch)?;
    info!("planned {} batches", batches.len());

    let mut weeks: Vec<Week> = Vec::with_capacity(total_weeks as usize);
    let mut genuine_weeks = 0usize;
    let mut any_degraded = false;
    let mut title_hint: Option<String> = None;
    let mut description_hint: Option<String> = None;
    let mut window = ContextWindow::empty();

    for (index, batch) in batches.iter().enumerate() {
        let result = run_batch(session, batch, &window, role, &config.retry).await;

        if let Some(fatal) = result.fatal {
            // Before any content exists, a dead provider is surfaced rather
            // than silently shipping an all-template roadmap (configurable).
            if index == 0 && config.first_batch_failure == FirstBatchFailurePolicy::Abort {
                info!("first batch failed non-transiently ({fatal}), aborting assembly");
                return Err(EngineError::Provider(fatal));
            }
        }

        info!(
            "batch {}-{} resolved: degraded={}, genuine_weeks={}",
            batch.start_week, batch.end_week, result.was_degraded, result.genuine_week_count
        );

        genuine_weeks += result.genuine_week_count;
        any_degraded |= result.was_degraded;
        if title_hint.is_none() {
            title_hint = result.title_hint;
        }
        if description_hint.is_none() {
            description_hint = result.description_hint;
        }

        window = extract(&result.weeks, config.context_tail_days);
        weeks.extend(result.weeks);
    }

    validate_week_coverage(&weeks, total_weeks)?;

    // Monotonically non-decreasing over the assembly: the genuine count only
    // grows and the denominator is fixed.
    let completion_fraction = genuine_weeks as f64 / total_weeks as f64;

    let status = if any_degraded {
        RoadmapStatus::PartiallyDegraded
    } else {
        RoadmapStatus::Complete
    };
    let start_date = Utc::now().date_naive();

    let roadmap = Roadmap {
        id: Uuid::new_v4(),
        title: title_hint
            .unwrap_or_else(|| format!("Your Journey to Becoming a {}", role.target_role)),
        description: description_hint.unwrap_or_else(|| {
            format!(
                "A personalized {total_weeks}-week learning path for an aspiring {}",
                role.target_role
            )
        }),
        target_role: role.target_role.clone(),
        total_weeks,
        start_date,
        end_date: start_date + Duration::weeks(total_weeks as i64),
        status,
        completion_fraction,
        weeks,
    };

    info!(
        "roadmap {} assembled: status={:?}, completion_fraction={:.2}",
        roadmap.id, roadmap.status, roadmap.completion_fraction
    );

    Ok(roadmap)
}

/// Checks the completeness/uniqueness invariant: week numbers are exactly
/// `1..=total_weeks`, ascending. A violation means a planner or orchestrator
/// bug, so it is fatal and the roadmap is withheld.
fn validate_week_coverage(weeks: &[Week], total_weeks: u32) -> Result<(), EngineError> {
    if weeks.len() as u32 != total_weeks {
        return Err(EngineError::Validation(format!(
            "assembled {} weeks, expected {total_weeks}",
            weeks.len()
        )));
    }
    for (i, week) in weeks.iter().enumerate() {
        let expected = i as u32 + 1;
        if week.number != expected {
            return Err(EngineError::Validation(format!(
                "week at position {i} has number {}, expected {expected}",
                week.number
            )));
        }
    }
    Ok(())
}
