//! Demo driver: assembles one roadmap from env configuration and prints it
//! as JSON. The real caller is a surrounding service layer; this binary
//! exists for local smoke runs.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use roadmap_engine::{generate, EngineConfig, LlmClient, LlmConfig, RoleContext};

#[tokio::main]
async fn main() -> Result<()> {
    let llm_config = LlmConfig::from_env()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("roadmap_engine=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting roadmap-engine v{}", env!("CARGO_PKG_VERSION"));

    let target_role =
        std::env::var("TARGET_ROLE").unwrap_or_else(|_| "backend developer".to_string());
    let total_weeks = std::env::var("ROADMAP_WEEKS")
        .unwrap_or_else(|_| "12".to_string())
        .parse::<u32>()?;

    let llm = LlmClient::new(llm_config);
    let role = RoleContext::for_role(target_role);
    let config = EngineConfig::default();

    let roadmap = generate(&llm, total_weeks, &role, &config).await?;

    info!(
        "assembled roadmap '{}' ({:?}, completion {:.0}%)",
        roadmap.title,
        roadmap.status,
        roadmap.completion_fraction * 100.0
    );

    println!("{}", serde_json::to_string_pretty(&roadmap)?);
    Ok(())
}
