use crate::config::{ConfigError, Settings};
use crate::llm::{AuthMode, UsageReport};
use crate::plugin::Analysis;

const TABLE_WIDTH: usize = 62;

/// Shorten `s` to at most `max` characters, ending in `...` when cut
pub fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let head: String = s.chars().take(keep).collect();
    format!("{}...", head)
}

/// Hide all but the first and last four characters of a key
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}

/// Settings echoed before a run; secrets masked
pub fn config_summary(settings: &Settings) -> String {
    let mut out = String::new();
    let mode = settings.auth_mode();

    out.push_str("\n--- Configuration ---\n");
    out.push_str(&format!("Target: {}\n", settings.target.display()));
    out.push_str(&format!("Model: {}\n", settings.model));
    out.push_str(&format!("Prompt: {}\n", truncate_str(&settings.prompt, 100)));
    out.push_str(&format!("Timeout: {}s\n", settings.timeout_seconds));
    out.push_str(&format!("Auth: {}\n", mode));

    if settings.git_diff {
        out.push_str("Git Diff: enabled\n");
    }
    if settings.max_files > 0 {
        out.push_str(&format!("Max Files: {}\n", settings.max_files));
    }
    if mode == AuthMode::StaticKey {
        out.push_str(&format!("API Key: {}\n", mask_api_key(&settings.api_key)));
    }
    if mode == AuthMode::ServiceAccount || !settings.gcp_project.is_empty() {
        out.push_str(&format!("GCP Project: {}\n", settings.gcp_project));
        out.push_str(&format!("GCP Location: {}\n", settings.gcp_location));
    }

    out
}

/// The summary of settings that passed validation
///
/// Invalid settings are reported before anything is echoed.
pub fn validated_summary(settings: &Settings) -> Result<String, ConfigError> {
    settings.validate()?;
    Ok(config_summary(settings))
}

fn border() -> String {
    format!("+{}+\n", "-".repeat(TABLE_WIDTH))
}

fn row(text: &str) -> String {
    format!("|  {:<width$}|\n", text, width = TABLE_WIDTH - 2)
}

/// Boxed token and cost breakdown
pub fn usage_table(usage: &UsageReport) -> String {
    let mut out = String::from("\n");

    out.push_str(&border());
    out.push_str(&format!("|{:^width$}|\n", "Token Usage Statistics", width = TABLE_WIDTH));
    out.push_str(&border());
    out.push_str(&row(&format!("Model: {}", usage.model)));
    if usage.estimated_input_tokens > 0 {
        out.push_str(&row(&format!("Estimated Input: {}", usage.estimated_input_tokens)));
    }
    out.push_str(&row(&format!("Input Tokens: {}", usage.input_tokens)));
    out.push_str(&row(&format!("Output Tokens: {}", usage.output_tokens)));
    if usage.thinking_tokens > 0 {
        out.push_str(&row(&format!("Thinking Tokens: {}", usage.thinking_tokens)));
    }
    out.push_str(&row(&format!("Total Tokens: {}", usage.total_tokens)));
    out.push_str(&border());

    if usage.long_context {
        out.push_str(&row("[!] Long context pricing applied"));
    }
    out.push_str(&row(&format!("Input Cost: ${:.6}", usage.input_cost)));
    out.push_str(&row(&format!("Output Cost: ${:.6}", usage.output_cost)));
    if usage.thinking_cost > 0.0 {
        out.push_str(&row(&format!("Thinking Cost: ${:.6}", usage.thinking_cost)));
    }
    out.push_str(&border());
    out.push_str(&row(&format!("Total Cost: ${:.6}", usage.total_cost)));
    out.push_str(&border());

    out
}

/// `Tokens: <in> in / <out> out = $<total>`
pub fn summary_line(usage: &UsageReport) -> String {
    format!(
        "Tokens: {} in / {} out = ${:.4}",
        usage.input_tokens, usage.output_tokens, usage.total_cost
    )
}

/// Human-readable result block
pub fn render_human(analysis: &Analysis) -> String {
    let mut out = String::from("=== AI Analysis Result ===\n\n");
    out.push_str(&analysis.text);
    out.push('\n');
    out.push_str(&usage_table(&analysis.usage));
    out.push_str(&summary_line(&analysis.usage));
    out.push('\n');
    out
}

pub fn render_json(analysis: &Analysis) -> serde_json::Result<String> {
    serde_json::to_string_pretty(analysis)
}
