//! Batch planning — partitions the requested week range into provider-sized
//! chunks so each call's output stays under the token ceiling.

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

/// An inclusive, contiguous range of week numbers generated in one provider
/// call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub start_week: u32,
    pub end_week: u32,
}

impl Batch {
    pub fn week_count(&self) -> u32 {
        self.end_week - self.start_week + 1
    }

    pub fn contains(&self, week_number: u32) -> bool {
        week_number >= self.start_week && week_number <= self.end_week
    }

    /// Week numbers in this batch, ascending.
    pub fn week_numbers(&self) -> impl Iterator<Item = u32> {
        self.start_week..=self.end_week
    }
}

/// Splits `1..=total_weeks` into consecutive batches of at most
/// `weeks_per_batch` weeks; the last batch may be shorter. Deterministic,
/// no I/O.
pub fn plan_batches(total_weeks: u32, weeks_per_batch: u32) -> Result<Vec<Batch>, EngineError> {
    if total_weeks == 0 {
        return Err(EngineError::Planning(
            "total_weeks must be positive".to_string(),
        ));
    }
    if weeks_per_batch == 0 {
        return Err(EngineError::Planning(
            "weeks_per_batch must be positive".to_string(),
        ));
    }

    let mut batches = Vec::new();
    let mut start = 1u32;
    while start <= total_weeks {
        let end = (start + weeks_per_batch - 1).min(total_weeks);
        batches.push(Batch {
            start_week: start,
            end_week: end,
        });
        start = end + 1;
    }
    Ok(batches)
}
