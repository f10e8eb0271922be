//! Core roadmap data model — the week/day/task hierarchy the engine assembles.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a roadmap during and after assembly.
///
/// A roadmap leaves `Assembling` exactly once; after that it is read-only
/// from the engine's point of view and handed to the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoadmapStatus {
    Assembling,
    Complete,
    PartiallyDegraded,
}

/// Kind of a single learning task.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    Reading,
    Practice,
    Project,
    Review,
}

/// A learning resource attached to a task. At most 3 per task survive
/// validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub url: String,
    /// documentation, tutorial, video, practice, article
    pub kind: String,
}

/// A single task inside a day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub title: String,
    pub description: String,
    pub task_type: TaskType,
    /// Always > 0 after validation.
    pub estimated_minutes: u32,
    /// Always in 1..=5 after validation.
    pub difficulty: u8,
    pub learning_objectives: Vec<String>,
    pub success_criteria: Option<String>,
    pub prerequisites: Vec<String>,
    pub resources: Vec<Resource>,
}

/// One day of a week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Day {
    /// 1-based within the week.
    pub number: u32,
    pub tasks: Vec<Task>,
}

/// One week of the roadmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Week {
    /// 1-based, unique within a roadmap.
    pub number: u32,
    pub focus_area: String,
    pub learning_objectives: Vec<String>,
    pub days: Vec<Day>,
}

/// The finished (or finishing) artifact.
///
/// Invariants once `status` leaves `Assembling`:
/// - `weeks` holds exactly one week per number in `1..=total_weeks`, ascending
/// - `completion_fraction` is the share of weeks produced by genuine
///   generation (as opposed to fallback templating)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roadmap {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub target_role: String,
    pub total_weeks: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: RoadmapStatus,
    pub completion_fraction: f64,
    pub weeks: Vec<Week>,
}

/// Profile and skill-gap summary driving prompt construction and fallback
/// content. Produced upstream (profile + gap analysis); the engine treats it
/// as read-only input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleContext {
    pub target_role: String,
    pub experience_level: String,
    pub learning_style: String,
    /// Daily learning budget in minutes. Guards against 0 at use sites.
    pub daily_minutes: u32,
    pub skills_to_learn: Vec<String>,
    pub skills_to_improve: Vec<String>,
    pub readiness_percent: u8,
}

impl RoleContext {
    /// A minimal context for a role when no profile data is available.
    pub fn for_role(target_role: impl Into<String>) -> Self {
        Self {
            target_role: target_role.into(),
            experience_level: "beginner".to_string(),
            learning_style: "mixed".to_string(),
            daily_minutes: 60,
            skills_to_learn: Vec::new(),
            skills_to_improve: Vec::new(),
            readiness_percent: 0,
        }
    }
}
