//! roadmap-engine — chunked generation of multi-week learning roadmaps.
//!
//! A provider's per-call output ceiling is smaller than a full roadmap, so
//! the engine generates in batches over one stateful chat session: plan the
//! week ranges, prompt per batch with a bounded sliding window of the
//! previous batch's tail, parse loosely structured output into a strict
//! schema, and degrade any unusable batch to deterministic templates so the
//! result is always structurally complete.
//!
//! Entry point: [`generate`] (or [`generation::assembler::assemble_with_session`]
//! to supply your own session, e.g. in tests).

pub mod config;
pub mod errors;
pub mod generation;
pub mod llm_client;
pub mod models;
pub mod retry;

pub use config::{EngineConfig, FirstBatchFailurePolicy, LlmConfig};
pub use errors::EngineError;
pub use llm_client::{ChatSession, LlmClient, ProviderError};
pub use models::roadmap::{Roadmap, RoadmapStatus, RoleContext};
pub use retry::RetryPolicy;

/// Generates a complete roadmap: the only call the surrounding CRUD layer
/// needs. Synchronous from the caller's perspective (awaits the whole batch
/// sequence); cancel by dropping the future — the provider session is
/// released with it.
pub async fn generate(
    llm: &LlmClient,
    total_weeks: u32,
    role: &RoleContext,
    config: &EngineConfig,
) -> Result<Roadmap, EngineError> {
    generation::assembler::assemble(llm, total_weeks, role, config).await
}
