use crate::context::rules::SelectionRules;
use crate::git::ChangeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("cannot read target {}: {source}", .path.display())]
    UnreadableTarget {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Size and count budget of a bundle; 0 means unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextLimits {
    pub max_files: usize,
    pub max_bytes: usize,
}

/// The limit that stopped emission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    MaxFiles(usize),
    MaxBytes(usize),
}

impl fmt::Display for Truncation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Truncation::MaxFiles(n) => {
                write!(f, "... [Truncated: reached max file limit of {} files] ...", n)
            }
            Truncation::MaxBytes(n) => {
                write!(f, "... [Truncated: reached max context size of {} bytes] ...", n)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextFile {
    /// Path relative to the target, `/`-separated
    pub path: String,
    pub content: String,
    pub size: usize,
}

/// Files selected for one prompt, in emission order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextBundle {
    pub files: Vec<ContextFile>,
    pub total_bytes: usize,
    pub truncation: Option<Truncation>,
}

impl ContextBundle {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.truncation.is_none()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }

    /// Render the bundle as it appears in the prompt
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.total_bytes + self.files.len() * 32);
        for file in &self.files {
            out.push_str(&format!("\n--- File: {} ---\n", file.path));
            out.push_str(&file.content);
            out.push('\n');
        }
        if let Some(truncation) = self.truncation {
            out.push_str(&format!("\n{}\n", truncation));
        }
        out
    }
}

struct Candidate {
    path: PathBuf,
    relative: String,
}

/// Walks a target and packs eligible files into a bounded bundle
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    rules: SelectionRules,
    limits: ContextLimits,
}

impl ContextAssembler {
    pub fn new(rules: SelectionRules, limits: ContextLimits) -> Self {
        Self { rules, limits }
    }

    /// Build the bundle for `target`
    ///
    /// Files listed in `changed` (target-relative) are emitted before all others.
    pub fn assemble(
        &self,
        target: &Path,
        changed: Option<&ChangeSet>,
    ) -> Result<ContextBundle, ContextError> {
        fs::metadata(target).map_err(|source| ContextError::UnreadableTarget {
            path: target.to_path_buf(),
            source,
        })?;

        let (priority, others): (Vec<Candidate>, Vec<Candidate>) = self
            .collect(target)?
            .into_iter()
            .partition(|c| changed.is_some_and(|set| set.contains(&c.relative)));

        tracing::debug!(
            prioritized = priority.len(),
            others = others.len(),
            "eligible context files"
        );

        let mut bundle = ContextBundle::default();
        for candidate in priority.into_iter().chain(others) {
            if self.limits.max_files > 0 && bundle.files.len() >= self.limits.max_files {
                tracing::debug!(limit = self.limits.max_files, "reached max file limit");
                bundle.truncation = Some(Truncation::MaxFiles(self.limits.max_files));
                break;
            }

            let content = match fs::read(&candidate.path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(path = %candidate.path.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };

            if self.limits.max_bytes > 0 && bundle.total_bytes + content.len() > self.limits.max_bytes
            {
                tracing::debug!(limit = self.limits.max_bytes, "reached max context size");
                bundle.truncation = Some(Truncation::MaxBytes(self.limits.max_bytes));
                break;
            }

            tracing::debug!(path = %candidate.relative, bytes = content.len(), "including file");
            bundle.total_bytes += content.len();
            bundle.files.push(ContextFile {
                path: candidate.relative,
                size: content.len(),
                content: String::from_utf8_lossy(&content).into_owned(),
            });
        }

        tracing::debug!(
            files = bundle.files.len(),
            bytes = bundle.total_bytes,
            "context assembled"
        );

        Ok(bundle)
    }

    /// Eligible files in walk order
    fn collect(&self, target: &Path) -> Result<Vec<Candidate>, ContextError> {
        let mut candidates = Vec::new();

        let walker = WalkDir::new(target)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| self.should_walk(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(ContextError::Walk {
                        path: target.to_path_buf(),
                        source: e,
                    });
                }
                Err(e) => {
                    tracing::debug!(error = %e, "skipping inaccessible path");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    tracing::debug!(path = %entry.path().display(), error = %e, "skipping file");
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy();
            if !self.rules.accepts_file(&name, size) {
                if size > self.rules.max_file_bytes() {
                    tracing::debug!(path = %entry.path().display(), size, "skipping large file");
                }
                continue;
            }

            candidates.push(Candidate {
                relative: relative_path(target, entry.path()),
                path: entry.into_path(),
            });
        }

        Ok(candidates)
    }

    fn should_walk(&self, entry: &DirEntry) -> bool {
        // The target itself is always walked, even when it is `.` or hidden
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }

        let walk = self.rules.descend_into(&entry.file_name().to_string_lossy());
        if !walk {
            tracing::debug!(dir = %entry.path().display(), "skipping excluded directory");
        }
        walk
    }
}

/// `path` relative to `root` with `/` separators; a file target maps to its own name
fn relative_path(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        _ => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn assembler(max_files: usize, max_bytes: usize) -> ContextAssembler {
        ContextAssembler::new(
            SelectionRules::default(),
            ContextLimits {
                max_files,
                max_bytes,
            },
        )
    }

    #[test]
    fn test_skips_hidden_and_excluded_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.go", "package main");
        write(dir.path(), ".github/workflow.yml", "on: push");
        write(dir.path(), "node_modules/lib/index.js", "x");
        write(dir.path(), "vendor/dep.go", "package dep");
        write(dir.path(), "pkg/util.go", "package pkg");

        let bundle = assembler(0, 0).assemble(dir.path(), None).unwrap();
        let paths: Vec<&str> = bundle.paths().collect();
        assert_eq!(paths, vec!["main.go", "pkg/util.go"]);
        assert!(bundle.truncation.is_none());
    }

    #[test]
    fn test_skips_hidden_files_and_unknown_extensions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".hidden.go", "package x");
        write(dir.path(), "logo.png", "png");
        write(dir.path(), "Dockerfile", "FROM scratch");

        let bundle = assembler(0, 0).assemble(dir.path(), None).unwrap();
        let paths: Vec<&str> = bundle.paths().collect();
        assert_eq!(paths, vec!["Dockerfile"]);
    }

    #[test]
    fn test_skips_large_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "big.go", &"a".repeat(100 * 1024 + 1));
        write(dir.path(), "edge.go", &"b".repeat(100 * 1024));

        let bundle = assembler(0, 0).assemble(dir.path(), None).unwrap();
        let paths: Vec<&str> = bundle.paths().collect();
        assert_eq!(paths, vec!["edge.go"]);
    }

    #[test]
    fn test_max_files_truncation() {
        let dir = TempDir::new().unwrap();
        for i in 0..51 {
            write(dir.path(), &format!("f{:02}.go", i), "x");
        }

        let bundle = assembler(50, 0).assemble(dir.path(), None).unwrap();
        assert_eq!(bundle.files.len(), 50);
        assert_eq!(bundle.truncation, Some(Truncation::MaxFiles(50)));
        assert!(bundle.render().contains("[Truncated: reached max file limit of 50 files]"));
    }

    #[test]
    fn test_exact_file_count_not_truncated() {
        let dir = TempDir::new().unwrap();
        for i in 0..3 {
            write(dir.path(), &format!("f{}.go", i), "x");
        }

        let bundle = assembler(3, 0).assemble(dir.path(), None).unwrap();
        assert_eq!(bundle.files.len(), 3);
        assert!(bundle.truncation.is_none());
    }

    #[test]
    fn test_max_bytes_truncation() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.go", &"a".repeat(40));
        write(dir.path(), "b.go", &"b".repeat(40));
        write(dir.path(), "c.go", &"c".repeat(40));

        let bundle = assembler(0, 100).assemble(dir.path(), None).unwrap();
        assert_eq!(bundle.files.len(), 2);
        assert_eq!(bundle.total_bytes, 80);
        assert_eq!(bundle.truncation, Some(Truncation::MaxBytes(100)));
        assert!(bundle.render().contains("[Truncated: reached max context size of 100 bytes]"));
    }

    #[test]
    fn test_changed_files_come_first() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.go", "a");
        write(dir.path(), "b.go", "b");
        write(dir.path(), "pkg/c.go", "c");
        write(dir.path(), "z.go", "z");

        let changed = ChangeSet::new(vec![
            "z.go".to_string(),
            "pkg/c.go".to_string(),
            "deleted.go".to_string(),
        ]);
        let bundle = assembler(0, 0).assemble(dir.path(), Some(&changed)).unwrap();
        let paths: Vec<&str> = bundle.paths().collect();

        // Walk order is kept inside each group
        assert_eq!(paths, vec!["pkg/c.go", "z.go", "a.go", "b.go"]);
    }

    #[test]
    fn test_changed_files_survive_truncation() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            write(dir.path(), &format!("f{}.go", i), "x");
        }

        let changed = ChangeSet::new(vec!["f4.go".to_string()]);
        let bundle = assembler(2, 0).assemble(dir.path(), Some(&changed)).unwrap();
        let paths: Vec<&str> = bundle.paths().collect();
        assert_eq!(paths, vec!["f4.go", "f0.go"]);
    }

    #[test]
    fn test_render_format() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.go", "package main");

        let bundle = assembler(0, 0).assemble(dir.path(), None).unwrap();
        assert_eq!(bundle.render(), "\n--- File: main.go ---\npackage main\n");
    }

    #[test]
    fn test_file_target() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.go", "package main");

        let bundle = assembler(0, 0)
            .assemble(&dir.path().join("main.go"), None)
            .unwrap();
        let paths: Vec<&str> = bundle.paths().collect();
        assert_eq!(paths, vec!["main.go"]);
    }

    #[test]
    fn test_missing_target() {
        let dir = TempDir::new().unwrap();
        let result = assembler(0, 0).assemble(&dir.path().join("nope"), None);
        assert!(matches!(result, Err(ContextError::UnreadableTarget { .. })));
    }

    #[test]
    fn test_hidden_target_is_still_walked() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".work/main.go", "package main");

        let bundle = assembler(0, 0)
            .assemble(&dir.path().join(".work"), None)
            .unwrap();
        assert_eq!(bundle.files.len(), 1);
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        let bundle = assembler(0, 0).assemble(dir.path(), None).unwrap();
        assert!(bundle.is_empty());
        assert_eq!(bundle.render(), "");
    }
}
