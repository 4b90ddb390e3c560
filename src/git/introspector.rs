use crate::error::{GitError, GitResult};
use crate::git::parser::CommitInfo;

/// CI variables that may carry the commit under test, in lookup order
pub const COMMIT_ENV_VARS: &[&str] = &[
    "DRONE_COMMIT_SHA",
    "DRONE_COMMIT",
    "CI_COMMIT_SHA",
    "GITHUB_SHA",
    "GITLAB_CI_COMMIT_SHA",
];

/// Diffs longer than this many characters are cut off in the git context
pub const MAX_DIFF_CHARS: usize = 50_000;

const DIFF_TRUNCATION_MARKER: &str = "\n... [diff truncated due to size] ...\n";

/// Read-only questions the plugin asks about the repository under analysis
pub trait RepoIntrospector: Send + Sync {
    /// Whether the target lives inside a repository
    fn is_repository(&self) -> bool;

    /// The commit to analyze, or `None` when nothing can be determined
    fn resolve_commit(&self, explicit: &str) -> Option<String>;

    fn commit_info(&self, commit: &str) -> GitResult<CommitInfo>;

    /// Repository-relative paths touched by `commit`
    fn changed_files(&self, commit: &str) -> GitResult<ChangeSet>;

    /// Unified diff of `commit` against its parent
    fn diff_text(&self, commit: &str) -> GitResult<String>;

    /// File-level change summary of `commit`
    fn diff_stat(&self, commit: &str) -> GitResult<String>;

    /// Location of the target inside the repository, e.g. `services/api/`
    fn path_prefix(&self) -> Option<String> {
        None
    }
}

/// Ordered set of paths touched by a commit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    paths: Vec<String>,
}

impl ChangeSet {
    pub fn new(paths: Vec<String>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Re-root the paths at `prefix`, dropping anything outside of it
    pub fn relative_to(&self, prefix: &str) -> ChangeSet {
        if prefix.is_empty() {
            return self.clone();
        }

        let prefix = if prefix.ends_with('/') {
            prefix.to_string()
        } else {
            format!("{}/", prefix)
        };

        let paths = self
            .paths
            .iter()
            .filter_map(|p| p.strip_prefix(prefix.as_str()))
            .map(str::to_string)
            .collect();

        ChangeSet { paths }
    }
}

/// Pick the commit to analyze
///
/// An explicit value wins, then the first non-empty CI variable, then HEAD.
pub fn resolve_commit_from<E, H>(explicit: &str, env_lookup: E, head: H) -> Option<String>
where
    E: Fn(&str) -> Option<String>,
    H: FnOnce() -> Option<String>,
{
    if !explicit.is_empty() {
        return Some(explicit.to_string());
    }

    for var in COMMIT_ENV_VARS {
        if let Some(sha) = env_lookup(var).filter(|v| !v.is_empty()) {
            tracing::debug!(var, sha = %sha, "commit detected from CI environment");
            return Some(sha);
        }
    }

    let sha = head().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    if let Some(ref sha) = sha {
        tracing::debug!(sha = %sha, "commit detected from HEAD");
    }
    sha
}

/// Reject revisions git would read as options
pub fn check_revision(commit: &str) -> GitResult<&str> {
    if commit.is_empty() {
        return Err(GitError::NoCommit);
    }
    if commit.starts_with('-') || commit.contains(char::is_whitespace) {
        return Err(GitError::InvalidRevision(commit.to_string()));
    }
    Ok(commit)
}

/// Git block of the prompt and the change set it lists
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GitContext {
    pub text: String,
    /// Repository-relative; `None` when the query failed
    pub changed: Option<ChangeSet>,
}

/// Render the git block of the prompt for `commit`
///
/// Every section is optional: whatever fails is logged and left out.
pub fn build_git_context(introspector: &dyn RepoIntrospector, commit: &str) -> GitContext {
    let mut context = String::new();

    match introspector.commit_info(commit) {
        Ok(info) => {
            context.push_str("=== Git Commit Information ===\n");
            context.push_str(&format!("Commit: {}\n", info.short_hash()));
            context.push_str(&format!("Author: {} <{}>\n", info.author, info.email));
            context.push_str(&format!("Date: {}\n", info.timestamp));
            context.push_str(&format!("Message: {}\n", info.message));
            context.push('\n');
        }
        Err(e) => tracing::warn!(commit, error = %e, "skipping commit information"),
    }

    let changed = match introspector.changed_files(commit) {
        Ok(changed) => {
            if !changed.is_empty() {
                context.push_str("=== Changed Files ===\n");
                for path in changed.paths() {
                    context.push_str(&format!("- {}\n", path));
                }
                context.push('\n');
            }
            Some(changed)
        }
        Err(e) => {
            tracing::warn!(commit, error = %e, "skipping changed files");
            None
        }
    };

    match introspector.diff_stat(commit) {
        Ok(stats) if !stats.is_empty() => {
            context.push_str("=== Change Statistics ===\n");
            context.push_str(&stats);
            context.push('\n');
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(commit, error = %e, "skipping diff statistics"),
    }

    match introspector.diff_text(commit) {
        Ok(diff) if !diff.is_empty() => {
            context.push_str("=== Commit Diff ===\n");
            let (head, truncated) = truncate_chars(&diff, MAX_DIFF_CHARS);
            context.push_str(head);
            if truncated {
                context.push_str(DIFF_TRUNCATION_MARKER);
            }
            context.push('\n');
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(commit, error = %e, "skipping diff"),
    }

    GitContext {
        text: context,
        changed,
    }
}

/// First `max` characters of `text`, and whether anything was cut
fn truncate_chars(text: &str, max: usize) -> (&str, bool) {
    match text.char_indices().nth(max) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}
