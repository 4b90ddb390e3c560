use crate::llm::credentials::AuthMode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;
pub const DEFAULT_MAX_FILES: usize = 50;
pub const DEFAULT_MAX_CONTEXT_SIZE: usize = 512_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("prompt is required: set PLUGIN_PROMPT")]
    PromptRequired,

    #[error(
        "no credentials provided: set PLUGIN_API_KEY for Google AI Studio or PLUGIN_GCP_CREDENTIALS + PLUGIN_GCP_PROJECT for Vertex AI"
    )]
    NoCredentials,

    #[error("GCP project ID is required for Vertex AI: set PLUGIN_GCP_PROJECT")]
    ProjectRequired,

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// Everything one plugin run needs to know
///
/// Empty strings mean "not supplied". Limits of 0 mean "no limit".
#[derive(Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Settings {
    /// Instruction for the model
    pub prompt: String,
    /// File or directory to scan
    pub target: PathBuf,
    pub model: String,
    /// Google AI Studio key
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Raw service-account JSON for Vertex AI
    #[serde(skip_serializing)]
    pub gcp_credentials: String,
    pub gcp_project: String,
    pub gcp_location: String,
    pub debug: bool,
    pub timeout_seconds: u64,
    /// Scope the analysis to a commit's diff
    pub git_diff: bool,
    pub git_commit_sha: String,
    pub max_files: usize,
    pub max_context_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            prompt: String::new(),
            target: PathBuf::from("."),
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            gcp_credentials: String::new(),
            gcp_project: String::new(),
            gcp_location: DEFAULT_LOCATION.to_string(),
            debug: false,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            git_diff: false,
            git_commit_sha: String::new(),
            max_files: DEFAULT_MAX_FILES,
            max_context_size: DEFAULT_MAX_CONTEXT_SIZE,
        }
    }
}

// Secrets stay out of debug output
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &str| if value.is_empty() { "" } else { "***" };
        f.debug_struct("Settings")
            .field("prompt", &self.prompt)
            .field("target", &self.target)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("gcp_credentials", &redact(&self.gcp_credentials))
            .field("gcp_project", &self.gcp_project)
            .field("gcp_location", &self.gcp_location)
            .field("debug", &self.debug)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("git_diff", &self.git_diff)
            .field("git_commit_sha", &self.git_commit_sha)
            .field("max_files", &self.max_files)
            .field("max_context_size", &self.max_context_size)
            .finish()
    }
}

impl Settings {
    /// Load settings from a TOML file; missing keys take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let settings: Settings = toml::from_str(&contents)?;
        Ok(settings)
    }

    /// Which credential scheme this run will use
    pub fn auth_mode(&self) -> AuthMode {
        AuthMode::detect(&self.api_key, &self.gcp_credentials, &self.gcp_project)
    }

    /// Check that a call can be attempted at all
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prompt.is_empty() {
            return Err(ConfigError::PromptRequired);
        }

        let auth_mode = self.auth_mode();
        if auth_mode == AuthMode::None {
            return Err(ConfigError::NoCredentials);
        }

        // detect() already requires a project, but don't rely on it
        if auth_mode == AuthMode::ServiceAccount && self.gcp_project.is_empty() {
            return Err(ConfigError::ProjectRequired);
        }

        if self.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue("model must not be empty".to_string()));
        }

        Ok(())
    }
}
