pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod git;
pub mod llm;
pub mod logging;
pub mod plugin;
pub mod report;

// Re-export commonly used types for convenience
pub use config::Settings;
pub use error::{AppError, AppResult, GitError};
pub use git::Repository;
pub use plugin::{Analysis, Plugin};
