use thiserror::Error;

use crate::llm_client::ProviderError;

/// Engine-level error type.
///
/// Parse trouble and per-batch provider trouble never surface here — they are
/// absorbed by the fallback path. What remains is: bad planning input, a
/// provider failure the configured policy chose to surface, or an invariant
/// violation on the assembled whole.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Planning error: {0}")]
    Planning(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_converts_into_engine_error() {
        let err: EngineError = ProviderError::AuthFailure.into();
        assert!(matches!(err, EngineError::Provider(_)));
    }

    #[test]
    fn test_planning_error_message() {
        let err = EngineError::Planning("total_weeks must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Planning error: total_weeks must be positive"
        );
    }
}
