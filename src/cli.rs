//! Command-line and environment surface
//!
//! CI plugins receive their parameters as `PLUGIN_*` environment variables; every
//! flag below also reads one. Flags and variables override the optional TOML file.

use crate::config::{ConfigError, Settings};
use crate::logging::LogFormat;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Result text, usage table and summary line
    #[default]
    Human,
    /// Result text and usage as one JSON document
    Json,
}

/// Send repository context to Gemini and report token cost
#[derive(Parser, Debug)]
#[command(name = "drone-gemini")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML file providing defaults for every other option
    #[arg(long, env = "PLUGIN_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Instruction for the model
    #[arg(long, env = "PLUGIN_PROMPT")]
    pub prompt: Option<String>,

    /// File or directory to analyze
    #[arg(long, env = "PLUGIN_TARGET")]
    pub target: Option<PathBuf>,

    #[arg(long, env = "PLUGIN_MODEL")]
    pub model: Option<String>,

    /// Google AI Studio API key
    #[arg(long, env = "PLUGIN_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Service-account JSON for Vertex AI
    #[arg(long, env = "PLUGIN_GCP_CREDENTIALS", hide_env_values = true)]
    pub gcp_credentials: Option<String>,

    #[arg(long, env = "PLUGIN_GCP_PROJECT")]
    pub gcp_project: Option<String>,

    /// Vertex AI region, or `global`
    #[arg(long, env = "PLUGIN_GCP_LOCATION")]
    pub gcp_location: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "PLUGIN_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Scope the analysis to a commit's diff
    #[arg(long, env = "PLUGIN_GIT_DIFF")]
    pub git_diff: bool,

    /// Commit to analyze instead of the detected one
    #[arg(long, env = "PLUGIN_GIT_COMMIT_SHA")]
    pub git_commit_sha: Option<String>,

    /// Maximum files in the context, 0 for no limit
    #[arg(long, env = "PLUGIN_MAX_FILES")]
    pub max_files: Option<usize>,

    /// Maximum context bytes, 0 for no limit
    #[arg(long, env = "PLUGIN_MAX_CONTEXT_SIZE")]
    pub max_context_size: Option<usize>,

    /// Debug logging
    #[arg(long, env = "PLUGIN_DEBUG")]
    pub debug: bool,

    #[arg(long, value_enum, env = "PLUGIN_FORMAT", default_value = "human")]
    pub format: OutputFormat,

    #[arg(long, value_enum, env = "PLUGIN_LOG_FORMAT", default_value = "human")]
    pub log_format: LogFormat,
}

impl Cli {
    /// Settings from the config file (or defaults) with flags applied on top
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        if let Some(prompt) = self.prompt {
            settings.prompt = prompt;
        }
        if let Some(target) = self.target {
            settings.target = target;
        }
        if let Some(model) = self.model {
            settings.model = model;
        }
        if let Some(api_key) = self.api_key {
            settings.api_key = api_key;
        }
        if let Some(gcp_credentials) = self.gcp_credentials {
            settings.gcp_credentials = gcp_credentials;
        }
        if let Some(gcp_project) = self.gcp_project {
            settings.gcp_project = gcp_project;
        }
        if let Some(gcp_location) = self.gcp_location {
            settings.gcp_location = gcp_location;
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_seconds = timeout;
        }
        if let Some(sha) = self.git_commit_sha {
            settings.git_commit_sha = sha;
        }
        if let Some(max_files) = self.max_files {
            settings.max_files = max_files;
        }
        if let Some(max_context_size) = self.max_context_size {
            settings.max_context_size = max_context_size;
        }
        settings.git_diff |= self.git_diff;
        settings.debug |= self.debug;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_into_settings() {
        let cli = Cli::try_parse_from([
            "drone-gemini",
            "--prompt",
            "review",
            "--target",
            "src",
            "--api-key",
            "AIzaKey",
            "--git-diff",
            "--max-files",
            "10",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);

        let settings = cli.into_settings().unwrap();
        assert_eq!(settings.prompt, "review");
        assert_eq!(settings.target, PathBuf::from("src"));
        assert_eq!(settings.api_key, "AIzaKey");
        assert!(settings.git_diff);
        assert_eq!(settings.max_files, 10);
        assert_eq!(settings.model, "gemini-2.5-pro");
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plugin.toml");
        fs::write(
            &path,
            "prompt = \"from file\"\nmodel = \"gemini-2.5-flash\"\ngit_diff = true\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "drone-gemini",
            "--config",
            path.to_str().unwrap(),
            "--prompt",
            "from flag",
        ])
        .unwrap();

        let settings = cli.into_settings().unwrap();
        assert_eq!(settings.prompt, "from flag");
        assert_eq!(settings.model, "gemini-2.5-flash");
        assert!(settings.git_diff);
    }

    #[test]
    fn test_missing_config_file() {
        let cli = Cli::try_parse_from(["drone-gemini", "--config", "/no/such/plugin.toml"]).unwrap();
        assert!(matches!(cli.into_settings(), Err(ConfigError::ReadError(_))));
    }

    #[test]
    fn test_invalid_format_rejected() {
        assert!(Cli::try_parse_from(["drone-gemini", "--format", "xml"]).is_err());
    }
}
