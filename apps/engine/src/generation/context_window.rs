//! Context window extraction — the bounded tail summary that primes the next
//! batch's prompt.
//!
//! The bound matters: the window is derived only from the last week of the
//! previous batch, and within it only the last few days, with task titles
//! truncated and capped. However large the roadmap grows, the rendered
//! fragment stays under a fixed size, so the sliding window can never itself
//! overflow the provider limit.

use serde::{Deserialize, Serialize};

use crate::models::roadmap::Week;

/// Task titles kept per day in the snapshot.
const MAX_TITLES_PER_DAY: usize = 4;
/// Title truncation length, in characters.
const MAX_TITLE_CHARS: usize = 80;

/// Compact snapshot of one trailing day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySnapshot {
    pub day_number: u32,
    pub task_titles: Vec<String>,
}

/// Read-only projection of the tail of the previous batch. Never treated as
/// ownership of prior content; it exists only to be rendered into the next
/// continuation prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextWindow {
    /// Week number the previous batch ended on. 0 for the empty window.
    pub after_week: u32,
    pub focus_area: String,
    pub tail_days: Vec<DaySnapshot>,
}

impl ContextWindow {
    /// The window used for the very first batch: nothing to continue from.
    pub fn empty() -> Self {
        Self {
            after_week: 0,
            focus_area: String::new(),
            tail_days: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.after_week == 0
    }

    /// Renders the window for prompt inclusion. Empty windows render to an
    /// empty string.
    pub fn to_prompt_fragment(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let mut out = format!(
            "The roadmap so far ends at week {} (focus: {}). Its final days covered:\n",
            self.after_week, self.focus_area
        );
        for day in &self.tail_days {
            out.push_str(&format!(
                "- Day {}: {}\n",
                day.day_number,
                day.task_titles.join("; ")
            ));
        }
        out
    }
}

/// Builds the context window from the previous batch's weeks: the last week
/// only, and within it the last `tail_days` days. Empty input yields the
/// empty window.
pub fn extract(previous_weeks: &[Week], tail_days: usize) -> ContextWindow {
    let last_week = match previous_weeks.last() {
        Some(week) => week,
        None => return ContextWindow::empty(),
    };

    let skip = last_week.days.len().saturating_sub(tail_days);
    let tail = last_week
        .days
        .iter()
        .skip(skip)
        .map(|day| DaySnapshot {
            day_number: day.number,
            task_titles: day
                .tasks
                .iter()
                .take(MAX_TITLES_PER_DAY)
                .map(|t| truncate_chars(&t.title, MAX_TITLE_CHARS))
                .collect(),
        })
        .collect();

    ContextWindow {
        after_week: last_week.number,
        focus_area: truncate_chars(&last_week.focus_area, MAX_TITLE_CHARS),
        tail_days: tail,
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
