use crate::config::ConfigError;
use crate::llm::auth::AuthError;
use crate::llm::pricing::UsageReport;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during a generation call
#[derive(Debug, Error)]
pub enum LLMError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Non-2xx answer, body kept verbatim
    #[error("API returned status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Error object inside an otherwise successful answer
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// 2xx answer whose body isn't a generateContent response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// Text produced by one call and what it cost
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generation {
    pub text: String,
    pub usage: UsageReport,
}

/// Trait for clients that turn a prompt into generated text
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Send `prompt` in a single unary request
    async fn generate(&self, prompt: &str) -> Result<Generation, LLMError>;
}
