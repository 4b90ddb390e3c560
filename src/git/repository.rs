use crate::error::GitResult;
use crate::git::executor::GitExecutor;
use crate::git::introspector::{ChangeSet, RepoIntrospector, check_revision, resolve_commit_from};
use crate::git::parser::{self, COMMIT_INFO_FORMAT, CommitInfo};
use std::env;
use std::path::Path;

/// A directory queried through the `git` CLI
#[derive(Debug)]
pub struct Repository {
    executor: GitExecutor,
}

impl Repository {
    /// Create a Repository rooted at (or inside) `path`
    ///
    /// Nothing is checked here; see [`RepoIntrospector::is_repository`].
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            executor: GitExecutor::new(path),
        }
    }

    /// Run a revision query, retrying as `git show` when `commit` has no parent
    fn diff_with_fallback(&self, commit: &str, mode: &str) -> GitResult<String> {
        let commit = check_revision(commit)?;
        let range = format!("{}^..{}", commit, commit);

        match self.executor.execute(&["diff", &range, mode]) {
            Ok(output) => Ok(output.stdout),
            Err(e) => {
                tracing::debug!(commit, error = %e, "diff against parent failed, using show");
                let output = self.executor.execute(&["show", commit, "--format=", mode])?;
                Ok(output.stdout)
            }
        }
    }

    fn head(&self) -> Option<String> {
        self.executor
            .execute(&["rev-parse", "HEAD"])
            .ok()
            .map(|output| output.stdout)
    }
}

impl RepoIntrospector for Repository {
    fn is_repository(&self) -> bool {
        self.executor.execute(&["rev-parse", "--git-dir"]).is_ok()
    }

    fn resolve_commit(&self, explicit: &str) -> Option<String> {
        resolve_commit_from(explicit, |name| env::var(name).ok(), || self.head())
    }

    fn commit_info(&self, commit: &str) -> GitResult<CommitInfo> {
        let commit = check_revision(commit)?;
        let output = self
            .executor
            .execute(&["log", "-1", COMMIT_INFO_FORMAT, commit])?;
        parser::parse_commit_info(&output.stdout)
    }

    fn changed_files(&self, commit: &str) -> GitResult<ChangeSet> {
        let commit = check_revision(commit)?;
        // --root so the first commit lists its files too
        let output = self.executor.execute(&[
            "diff-tree",
            "--no-commit-id",
            "--name-only",
            "-r",
            "--root",
            commit,
        ])?;
        Ok(ChangeSet::new(parser::parse_name_only(&output.stdout)))
    }

    fn diff_text(&self, commit: &str) -> GitResult<String> {
        self.diff_with_fallback(commit, "--unified=3")
    }

    fn diff_stat(&self, commit: &str) -> GitResult<String> {
        self.diff_with_fallback(commit, "--stat")
    }

    fn path_prefix(&self) -> Option<String> {
        self.executor
            .execute(&["rev-parse", "--show-prefix"])
            .ok()
            .map(|output| output.stdout.trim().to_string())
    }
}
