use std::io;
use thiserror::Error;

// Import module-level errors for AppError
use crate::config::settings::ConfigError;
use crate::context::assembler::ContextError;
use crate::llm::auth::AuthError;
use crate::llm::client::LLMError;

/// Errors that can occur during git operations
///
/// These never abort a run: the git context degrades to whatever pieces succeeded.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("No commit could be determined")]
    NoCommit,

    #[error("Invalid revision: {0}")]
    InvalidRevision(String),

    #[error("Git command failed: {0}")]
    CommandFailed(String),

    #[error("Failed to parse git output: {0}")]
    ParseError(String),

    #[error("Failed to run git: {0}")]
    IoError(#[from] io::Error),
}

/// Top-level application error that wraps all module-specific errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Llm(LLMError),

    #[error("Context build error: {0}")]
    Context(#[from] ContextError),
}

// Configuration and authentication failures keep their own category even
// when they surface from inside the client.
impl From<LLMError> for AppError {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::Config(e) => AppError::Config(e),
            LLMError::Auth(e) => AppError::Auth(e),
            other => AppError::Llm(other),
        }
    }
}

impl AppError {
    /// Process exit code for this failure
    ///
    /// Configuration problems exit with 2, everything else with 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) => 2,
            _ => 1,
        }
    }
}

/// Result type for git operations
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
