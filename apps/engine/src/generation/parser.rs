//! Response parsing — turns raw provider text into validated weeks.
//!
//! Parsing is an ordered chain of pure steps, each returning a tagged
//! outcome instead of throwing:
//! 1. strip code fences, strict `serde_json` parse against the batch schema
//! 2. lenient pass: locate the largest balanced JSON object embedded in
//!    surrounding prose and strict-parse that
//! 3. give up with `ParseFailure`
//!
//! On success, field-level validation runs: tasks with out-of-range
//! difficulty or non-positive duration are dropped with a warning, weeks
//! outside the requested batch range are dropped, and a batch with zero
//! surviving weeks becomes a `ParseFailure` after all.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::generation::planner::Batch;
use crate::llm_client::ProviderError;
use crate::models::roadmap::{Day, Resource, Task, TaskType, Week};

/// Max resources kept per task.
const MAX_RESOURCES_PER_TASK: usize = 3;

/// Outcome of one batch's generation attempt.
#[derive(Debug)]
pub enum BatchOutcome {
    Success(ParsedBatch),
    ParseFailure { detail: String },
    Provider(ProviderError),
}

/// A validated batch-worth of weeks plus optional artifact-level hints the
/// model may volunteer on the first batch.
#[derive(Debug)]
pub struct ParsedBatch {
    pub weeks: Vec<Week>,
    pub title_hint: Option<String>,
    pub description_hint: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Wire schema (what the model is asked to emit)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct BatchPayload {
    #[serde(default)]
    roadmap_title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    weeks: Vec<WeekPayload>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WeekPayload {
    // `number` accepted too so the parser round-trips its own Week output.
    #[serde(alias = "number")]
    week_number: u32,
    #[serde(default)]
    focus_area: String,
    #[serde(default)]
    learning_objectives: Vec<String>,
    #[serde(default)]
    days: Vec<DayPayload>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DayPayload {
    #[serde(alias = "number")]
    day_number: u32,
    #[serde(default)]
    tasks: Vec<TaskPayload>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TaskPayload {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    task_type: TaskType,
    // Signed on purpose: a model emitting -30 or 0 must fail validation, not
    // deserialization of the whole payload.
    #[serde(default, alias = "estimated_duration")]
    estimated_minutes: i64,
    #[serde(default)]
    difficulty: i64,
    #[serde(default)]
    learning_objectives: Vec<String>,
    #[serde(default)]
    success_criteria: Option<String>,
    #[serde(default)]
    prerequisites: Vec<String>,
    #[serde(default)]
    resources: Vec<Resource>,
}

// ────────────────────────────────────────────────────────────────────────────
// Parse chain
// ────────────────────────────────────────────────────────────────────────────

/// Parses raw provider text for `batch`. Never returns `Provider`.
///
/// Idempotent on valid structured input: re-serializing a successful result
/// and parsing it again yields the same weeks.
pub fn parse_batch(raw: &str, batch: &Batch) -> BatchOutcome {
    let stripped = strip_json_fences(raw);

    let payload = match serde_json::from_str::<BatchPayload>(stripped) {
        Ok(p) => p,
        Err(strict_err) => match extract_json_object(stripped)
            .and_then(|fragment| serde_json::from_str::<BatchPayload>(fragment).ok())
        {
            Some(p) => p,
            None => {
                return BatchOutcome::ParseFailure {
                    detail: format!("strict parse failed ({strict_err}); no recoverable JSON object found"),
                }
            }
        },
    };

    validate_payload(payload, batch)
}

/// Field-level validation with drop-and-warn semantics.
fn validate_payload(payload: BatchPayload, batch: &Batch) -> BatchOutcome {
    let mut weeks: Vec<Week> = Vec::new();

    for week in payload.weeks {
        if !batch.contains(week.week_number) {
            warn!(
                "dropping week {}: outside requested range {}-{}",
                week.week_number, batch.start_week, batch.end_week
            );
            continue;
        }
        if weeks.iter().any(|w| w.number == week.week_number) {
            warn!("dropping duplicate week {}", week.week_number);
            continue;
        }

        let days: Vec<Day> = week
            .days
            .into_iter()
            .map(|day| Day {
                number: day.day_number,
                tasks: day
                    .tasks
                    .into_iter()
                    .filter_map(|t| validate_task(t, week.week_number))
                    .collect(),
            })
            .filter(|day| !day.tasks.is_empty())
            .collect();

        if days.is_empty() {
            warn!("dropping week {}: no valid tasks survived", week.week_number);
            continue;
        }

        weeks.push(Week {
            number: week.week_number,
            focus_area: week.focus_area,
            learning_objectives: week.learning_objectives,
            days,
        });
    }

    if weeks.is_empty() {
        return BatchOutcome::ParseFailure {
            detail: format!(
                "payload parsed but no valid weeks in range {}-{}",
                batch.start_week, batch.end_week
            ),
        };
    }

    weeks.sort_by_key(|w| w.number);

    BatchOutcome::Success(ParsedBatch {
        weeks,
        title_hint: payload.roadmap_title,
        description_hint: payload.description,
    })
}

fn validate_task(task: TaskPayload, week_number: u32) -> Option<Task> {
    if task.title.trim().is_empty() {
        warn!("week {week_number}: dropping task with empty title");
        return None;
    }
    if !(1..=5).contains(&task.difficulty) {
        warn!(
            "week {week_number}: dropping task '{}': difficulty {} not in 1..=5",
            task.title, task.difficulty
        );
        return None;
    }
    // try_from, not `as`: a value above u32::MAX must drop the task, not
    // truncate into the valid range.
    let estimated_minutes = match u32::try_from(task.estimated_minutes) {
        Ok(m) if m > 0 => m,
        _ => {
            warn!(
                "week {week_number}: dropping task '{}': estimated_minutes {} not a positive u32",
                task.title, task.estimated_minutes
            );
            return None;
        }
    };

    let mut resources = task.resources;
    if resources.len() > MAX_RESOURCES_PER_TASK {
        warn!(
            "week {week_number}: task '{}': truncating {} resources to {}",
            task.title,
            resources.len(),
            MAX_RESOURCES_PER_TASK
        );
        resources.truncate(MAX_RESOURCES_PER_TASK);
    }

    Some(Task {
        title: task.title,
        description: task.description,
        task_type: task.task_type,
        estimated_minutes,
        difficulty: task.difficulty as u8,
        learning_objectives: task.learning_objectives,
        success_criteria: task.success_criteria,
        prerequisites: task.prerequisites,
        resources,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Repair helpers
// ────────────────────────────────────────────────────────────────────────────

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Finds the largest balanced `{...}` object in `text`, honouring string
/// literals and escapes. Used to dig a JSON payload out of surrounding prose.
fn extract_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut best: Option<(usize, usize)> = None;
    let mut start_stack: Vec<usize> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => start_stack.push(i),
            b'}' => {
                if let Some(start) = start_stack.pop() {
                    // Only top-level objects are candidates.
                    if start_stack.is_empty() {
                        let len = i - start + 1;
                        if best.map_or(true, |(s, e)| len > e - s + 1) {
                            best = Some((start, i));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    best.map(|(s, e)| &text[s..=e])
}
