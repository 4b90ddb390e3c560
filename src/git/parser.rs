use crate::error::{GitError, GitResult};

/// `git log` format understood by [`parse_commit_info`]
pub const COMMIT_INFO_FORMAT: &str = "--format=%H%x00%an%x00%ae%x00%ci%x00%s";

/// Metadata of a single commit
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    pub hash: String,
    pub author: String,
    pub email: String,
    pub timestamp: String,
    pub message: String,
}

impl CommitInfo {
    /// Hash abbreviated to 12 characters
    pub fn short_hash(&self) -> &str {
        self.hash.get(..12).unwrap_or(&self.hash)
    }
}

/// Parse `git log -1` output produced with [`COMMIT_INFO_FORMAT`]
pub fn parse_commit_info(output: &str) -> GitResult<CommitInfo> {
    let parts: Vec<&str> = output.splitn(5, '\0').collect();
    if parts.len() < 5 {
        return Err(GitError::ParseError(format!(
            "Unexpected git log output: expected 5 fields, got {}",
            parts.len()
        )));
    }

    let hash = parts[0].trim();
    if hash.is_empty() {
        return Err(GitError::ParseError("Missing commit hash".to_string()));
    }

    Ok(CommitInfo {
        hash: hash.to_string(),
        author: parts[1].to_string(),
        email: parts[2].to_string(),
        timestamp: parts[3].to_string(),
        message: parts[4].trim().to_string(),
    })
}

/// Parse `--name-only` output into a list of paths
pub fn parse_name_only(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
