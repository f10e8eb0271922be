//! Fallback week construction — deterministic, template-driven weeks used
//! when generation for a batch is unavailable or unusable.
//!
//! This path must be total: it never fails, never touches the provider, and
//! always yields schema-valid content, so a degraded roadmap is still a
//! structurally complete one.

use tracing::info;

use crate::generation::planner::Batch;
use crate::models::roadmap::{Day, Resource, RoleContext, Task, TaskType, Week};

/// Focus labels for the opening arc of a roadmap. Weeks past the table get a
/// generic consolidation label.
const WEEK_FOCUS: &[(&str, &str)] = &[
    ("Foundation & Setup", "Set up your environment and learn the basics"),
    ("Core Concepts", "Deep dive into fundamental concepts and patterns"),
    ("Intermediate Skills", "Build on foundations with more complex topics"),
    ("Applied Learning", "Apply your skills in a practical project"),
];

/// Default skills per role family, matched by substring on the lowercased
/// role name.
const ROLE_SKILLS: &[(&str, &[&str])] = &[
    ("frontend", &["HTML", "CSS", "JavaScript", "React", "TypeScript", "Responsive Design", "Git"]),
    ("backend", &["Python", "Node.js", "Databases", "REST APIs", "SQL", "Authentication", "Git"]),
    ("fullstack", &["HTML/CSS", "JavaScript", "React", "Node.js", "Databases", "REST APIs", "Git", "Deployment"]),
    ("data scientist", &["Python", "Pandas", "NumPy", "Machine Learning", "SQL", "Data Visualization", "Statistics"]),
    ("data analyst", &["SQL", "Excel", "Python", "Data Visualization", "Statistics", "Tableau/PowerBI"]),
    ("devops", &["Linux", "Docker", "Kubernetes", "CI/CD", "AWS/Azure", "Terraform", "Scripting"]),
    ("machine learning", &["Python", "TensorFlow/PyTorch", "Mathematics", "Statistics", "Deep Learning", "Data Processing"]),
    ("mobile", &["React Native", "Flutter", "iOS/Android", "Mobile UI/UX", "APIs", "App Store Deployment"]),
    ("cloud", &["AWS", "Azure", "GCP", "Networking", "Security", "IaC", "Serverless"]),
    ("cybersecurity", &["Network Security", "Ethical Hacking", "Cryptography", "Security Tools", "Compliance", "Incident Response"]),
];

const GENERIC_SKILLS: &[&str] = &[
    "Programming Fundamentals",
    "Problem Solving",
    "Git Version Control",
    "Documentation",
    "Best Practices",
    "Testing",
];

const DAYS_PER_WEEK: u32 = 5;

/// Skills to rotate through for a role: the profile's gap list when present,
/// otherwise the role-family table, otherwise generic tech skills.
pub fn default_skills_for_role(role: &RoleContext) -> Vec<String> {
    if !role.skills_to_learn.is_empty() {
        return role.skills_to_learn.clone();
    }
    let role_lower = role.target_role.to_lowercase();
    for (key, skills) in ROLE_SKILLS {
        if role_lower.contains(key) {
            return skills.iter().map(|s| s.to_string()).collect();
        }
    }
    GENERIC_SKILLS.iter().map(|s| s.to_string()).collect()
}

/// Builds exactly `batch.week_count()` schema-valid weeks covering the
/// batch's range.
pub fn build_fallback_weeks(batch: &Batch, role: &RoleContext) -> Vec<Week> {
    info!(
        "building fallback weeks {}-{} for role '{}'",
        batch.start_week, batch.end_week, role.target_role
    );
    batch
        .week_numbers()
        .map(|number| build_fallback_week(number, role))
        .collect()
}

/// Builds a single fallback week. Used both for whole degraded batches and
/// for filling individual holes in a partially parsed batch.
pub fn build_fallback_week(number: u32, role: &RoleContext) -> Week {
    let skills = default_skills_for_role(role);
    let (focus_title, focus_desc) = week_focus(number);

    // Rotate through the skill list two at a time per week. Widened to u64
    // so the rotation arithmetic cannot overflow for any week number.
    let idx = ((number as u64 - 1) * 2 % skills.len() as u64) as usize;
    let primary = skills[idx].clone();
    let secondary = skills[(idx + 1) % skills.len()].clone();

    let days = (1..=DAYS_PER_WEEK)
        .map(|day| build_fallback_day(day, number, &primary, &secondary, role))
        .collect();

    Week {
        number,
        focus_area: format!("{focus_title}: {primary}, {secondary}"),
        learning_objectives: vec![format!("Master {primary}"), focus_desc.to_string()],
        days,
    }
}

fn week_focus(number: u32) -> (&'static str, &'static str) {
    WEEK_FOCUS
        .get(number as usize - 1)
        .copied()
        .unwrap_or(("Consolidation & Practice", "Continue building depth and routine"))
}

fn build_fallback_day(
    day: u32,
    week_number: u32,
    primary: &str,
    secondary: &str,
    role: &RoleContext,
) -> Day {
    // First two days read, middle days practice, last day builds.
    let day_type = match day {
        1 | 2 => TaskType::Reading,
        3 | 4 => TaskType::Practice,
        _ => TaskType::Project,
    };
    let minutes = (role.daily_minutes / 2).max(15);
    let difficulty = week_difficulty(week_number);

    let first_title = if day <= 2 {
        format!("Learn {primary}")
    } else {
        format!("Practice {primary}")
    };
    let mut tasks = vec![Task {
        title: first_title.clone(),
        description: format!(
            "{} {primary} for {} work",
            if day <= 2 { "Study the fundamentals of" } else { "Apply your knowledge of" },
            role.target_role
        ),
        task_type: day_type,
        estimated_minutes: minutes,
        difficulty,
        learning_objectives: vec![
            format!("Understand {primary} basics"),
            format!("Apply {primary} concepts"),
        ],
        success_criteria: Some(format!(
            "Complete the {primary} exercises and understand the core concepts"
        )),
        prerequisites: if week_number == 1 {
            vec![]
        } else {
            vec![format!("Week {} completed", week_number - 1)]
        },
        resources: vec![Resource {
            title: format!("{primary} Documentation"),
            url: "https://developer.mozilla.org/en-US/docs/Learn".to_string(),
            kind: "documentation".to_string(),
        }],
    }];

    // A second, hands-on task for the back half of the week.
    if day >= 3 {
        tasks.push(Task {
            title: if day <= 4 {
                format!("Hands-on {secondary}")
            } else {
                format!("Mini Project: {secondary}")
            },
            description: format!("Build practical experience with {secondary}"),
            task_type: if day <= 4 { TaskType::Practice } else { TaskType::Project },
            estimated_minutes: minutes,
            difficulty: week_difficulty(week_number),
            learning_objectives: vec![
                format!("Practice {secondary}"),
                "Build something useful".to_string(),
            ],
            success_criteria: Some(format!("Complete a working example using {secondary}")),
            prerequisites: vec![first_title],
            resources: vec![Resource {
                title: format!("{secondary} Tutorial"),
                url: "https://www.freecodecamp.org/learn".to_string(),
                kind: "tutorial".to_string(),
            }],
        });
    }

    Day { number: day, tasks }
}

/// Difficulty ramps with week number, clamped to the valid 1..=5 range.
fn week_difficulty(week_number: u32) -> u8 {
    week_number.saturating_add(1).min(5) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role() -> RoleContext {
        RoleContext::for_role("backend developer")
    }

    fn assert_week_valid(week: &Week) {
        assert!(!week.focus_area.is_empty());
        assert!(!week.days.is_empty());
        for day in &week.days {
            assert!(day.number >= 1);
            assert!(!day.tasks.is_empty());
            for task in &day.tasks {
                assert!(!task.title.is_empty());
                assert!(task.estimated_minutes > 0);
                assert!((1..=5).contains(&task.difficulty));
                assert!(task.resources.len() <= 3);
            }
        }
    }

    // Totality: exactly the requested count, all schema-valid, for any range.
    #[test]
    fn test_builds_exactly_the_requested_week_count() {
        for (start, end) in [(1u32, 3u32), (4, 6), (10, 12), (7, 7), (1, 24)] {
            let batch = Batch { start_week: start, end_week: end };
            let weeks = build_fallback_weeks(&batch, &role());
            assert_eq!(weeks.len() as u32, batch.week_count());
            for (i, week) in weeks.iter().enumerate() {
                assert_eq!(week.number, start + i as u32);
                assert_week_valid(week);
            }
        }
    }

    #[test]
    fn test_backend_role_gets_backend_skills() {
        let skills = default_skills_for_role(&role());
        assert!(skills.contains(&"SQL".to_string()));
    }

    #[test]
    fn test_unknown_role_gets_generic_skills() {
        let skills = default_skills_for_role(&RoleContext::for_role("quantum basket weaver"));
        assert!(skills.contains(&"Programming Fundamentals".to_string()));
    }

    #[test]
    fn test_profile_skills_take_precedence() {
        let mut r = role();
        r.skills_to_learn = vec!["Kafka".to_string(), "gRPC".to_string()];
        let skills = default_skills_for_role(&r);
        assert_eq!(skills, vec!["Kafka".to_string(), "gRPC".to_string()]);
    }

    #[test]
    fn test_difficulty_is_clamped_for_late_weeks() {
        let week = build_fallback_week(20, &role());
        for day in &week.days {
            for task in &day.tasks {
                assert!(task.difficulty <= 5);
            }
        }
    }

    #[test]
    fn test_extreme_week_number_does_not_overflow() {
        let week = build_fallback_week(u32::MAX, &role());
        assert_eq!(week.number, u32::MAX);
        assert_week_valid(&week);
    }

    #[test]
    fn test_first_week_has_no_prerequisites() {
        let week = build_fallback_week(1, &role());
        assert!(week.days[0].tasks[0].prerequisites.is_empty());
    }

    #[test]
    fn test_later_weeks_require_previous_week() {
        let week = build_fallback_week(3, &role());
        assert_eq!(
            week.days[0].tasks[0].prerequisites,
            vec!["Week 2 completed".to_string()]
        );
    }

    #[test]
    fn test_tiny_daily_budget_still_yields_positive_minutes() {
        let mut r = role();
        r.daily_minutes = 1;
        let week = build_fallback_week(1, &r);
        for day in &week.days {
            for task in &day.tasks {
                assert!(task.estimated_minutes >= 15);
            }
        }
    }

    #[test]
    fn test_deterministic_for_same_inputs() {
        let a = build_fallback_week(2, &role());
        let b = build_fallback_week(2, &role());
        assert_eq!(
            serde_json::to_value(&a).unwrap(),
            serde_json::to_value(&b).unwrap()
        );
    }
}
