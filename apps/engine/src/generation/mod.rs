//! The chunked generation engine: planning, per-batch orchestration,
//! parsing, fallback, and final assembly.

pub mod assembler;
pub mod context_window;
pub mod fallback;
pub mod orchestrator;
pub mod parser;
pub mod planner;

/// Shared test doubles for the async generation paths.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use async_trait::async_trait;

    use crate::llm_client::{ChatSession, ProviderError};

    /// Scripted session: pops one canned response per send.
    pub struct ScriptedSession {
        pub responses: VecDeque<Result<String, ProviderError>>,
        pub sent_prompts: Vec<String>,
    }

    impl ScriptedSession {
        pub fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
            Self {
                responses: responses.into(),
                sent_prompts: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl ChatSession for ScriptedSession {
        async fn send(&mut self, prompt: &str) -> Result<String, ProviderError> {
            self.sent_prompts.push(prompt.to_string());
            self.responses
                .pop_front()
                .unwrap_or(Err(ProviderError::EmptyContent))
        }
    }

    /// A minimal valid batch payload covering the given week range.
    pub fn weeks_json(range: std::ops::RangeInclusive<u32>) -> String {
        let weeks: Vec<serde_json::Value> = range
            .map(|n| {
                serde_json::json!({
                    "week_number": n,
                    "focus_area": format!("Focus {n}"),
                    "learning_objectives": ["learn things"],
                    "days": [{
                        "day_number": 1,
                        "tasks": [{
                            "title": format!("Task for week {n}"),
                            "description": "d",
                            "task_type": "reading",
                            "estimated_minutes": 30,
                            "difficulty": 2
                        }]
                    }]
                })
            })
            .collect();
        serde_json::json!({ "weeks": weeks }).to_string()
    }
}
