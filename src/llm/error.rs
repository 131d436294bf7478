//! LLM error types

use thiserror::Error;

/// Errors from the reasoning backend.
///
/// The core never retries these: the plan generator and reflector absorb
/// them through their deterministic fallbacks, so callers decide retry
/// policy at a higher layer.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LlmError::ApiError {
            status: 500,
            message: "Server error".to_string(),
        };
        assert_eq!(err.to_string(), "API error 500: Server error");

        let err = LlmError::InvalidResponse("empty completion".to_string());
        assert_eq!(err.to_string(), "Invalid response: empty completion");
    }
}
