//! All LLM prompt constants and builders for roadmap generation.
//!
//! Templates use `{placeholder}` replacement; builders fill them from the
//! role context, the batch range, and the sliding context window.

use crate::generation::context_window::ContextWindow;
use crate::generation::planner::Batch;
use crate::models::roadmap::RoleContext;

/// System prompt for the whole generation session — enforces JSON-only output.
pub const ROADMAP_SYSTEM: &str = "You are an expert career mentor and technical educator. \
    You create detailed, practical learning roadmaps, delivered in batches of weeks. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Prompt for the first batch. Establishes the role, profile, and the exact
/// JSON schema; later batches reuse the schema via the session history.
const FIRST_BATCH_TEMPLATE: &str = r#"Create weeks {start_week}-{end_week} of a {total_hint}learning roadmap for becoming a **{target_role}**.

## User Profile:
- Target Career Goal: {target_role}
- Experience Level: {experience_level}
- Daily Learning Time: {daily_minutes} minutes
- Preferred Learning Style: {learning_style}

## Skills to Master:
{skills_to_learn}

## Skills to Improve:
{skills_to_improve}

## Current Readiness: {readiness_percent}%

Each week should have 5-6 days with 2-3 tasks per day.
Each task should fit within {half_minutes} to {daily_minutes} minutes.
Include actual learning resources with real URLs (official documentation, FreeCodeCamp, specific YouTube channels, GitHub repositories).

Return this exact JSON structure:
{
  "roadmap_title": "Your Journey to Becoming a {target_role}",
  "description": "One-sentence description of this learning path",
  "weeks": [
    {
      "week_number": {start_week},
      "focus_area": "Foundations & Setup",
      "learning_objectives": ["objective1", "objective2"],
      "days": [
        {
          "day_number": 1,
          "tasks": [
            {
              "title": "Specific task title",
              "description": "What to learn and why it matters for a {target_role}",
              "task_type": "reading",
              "estimated_minutes": {half_minutes},
              "difficulty": 2,
              "learning_objectives": ["objective1"],
              "success_criteria": "You can explain X and do Y",
              "prerequisites": [],
              "resources": [
                {"title": "Resource Name", "url": "https://actual-url.com", "kind": "documentation"}
              ]
            }
          ]
        }
      ]
    }
  ]
}

"task_type" must be one of: "reading", "practice", "project", "review".
"difficulty" is an integer from 1 to 5. "estimated_minutes" is a positive integer.
Generate exactly weeks {start_week} through {end_week} ({week_count} weeks), no more, no fewer."#;

/// Prompt for every batch after the first. The session history carries the
/// full schema and earlier content; this only supplies the continuation
/// boundary plus the explicit tail context.
const CONTINUATION_TEMPLATE: &str = r#"{context_fragment}
Continue the roadmap for the aspiring {target_role}.

Now generate weeks {start_week} through {end_week} ({week_count} weeks), building on everything already covered.
Do not repeat earlier material; increase depth and difficulty naturally.
Return JSON with the same structure as before: a top-level "weeks" array only.
Number the weeks exactly {start_week} through {end_week}."#;

/// Builds the prompt for a batch. The first batch (empty context window)
/// gets the full schema-bearing prompt; later batches get the continuation
/// form primed by the window.
pub fn build_batch_prompt(batch: &Batch, role: &RoleContext, window: &ContextWindow) -> String {
    if window.is_empty() {
        build_first_batch_prompt(batch, role)
    } else {
        build_continuation_prompt(batch, role, window)
    }
}

fn build_first_batch_prompt(batch: &Batch, role: &RoleContext) -> String {
    let skills_to_learn = joined_or(&role.skills_to_learn, 8, "Core skills for the role");
    let skills_to_improve = joined_or(&role.skills_to_improve, 4, "Foundational skills");
    let daily = role.daily_minutes.max(30);

    FIRST_BATCH_TEMPLATE
        .replace("{total_hint}", "multi-week ")
        .replace("{target_role}", &role.target_role)
        .replace("{experience_level}", &role.experience_level)
        .replace("{learning_style}", &role.learning_style)
        .replace("{skills_to_learn}", &skills_to_learn)
        .replace("{skills_to_improve}", &skills_to_improve)
        .replace("{readiness_percent}", &role.readiness_percent.to_string())
        .replace("{half_minutes}", &(daily / 2).to_string())
        .replace("{daily_minutes}", &daily.to_string())
        .replace("{start_week}", &batch.start_week.to_string())
        .replace("{end_week}", &batch.end_week.to_string())
        .replace("{week_count}", &batch.week_count().to_string())
}

fn build_continuation_prompt(batch: &Batch, role: &RoleContext, window: &ContextWindow) -> String {
    CONTINUATION_TEMPLATE
        .replace("{context_fragment}", &window.to_prompt_fragment())
        .replace("{target_role}", &role.target_role)
        .replace("{start_week}", &batch.start_week.to_string())
        .replace("{end_week}", &batch.end_week.to_string())
        .replace("{week_count}", &batch.week_count().to_string())
}

fn joined_or(items: &[String], cap: usize, fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items
            .iter()
            .take(cap)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }
}
