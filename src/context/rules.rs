use std::collections::HashSet;
use std::path::Path;

/// Directory names that are never descended into
pub const EXCLUDED_DIRS: &[&str] = &[
    "context",
    "vendor",
    "node_modules",
    "dist",
    "build",
    "target",
    "__pycache__",
    ".git",
    ".idea",
    ".vscode",
];

/// File extensions (lowercase, no dot) that count as source
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "go", "py", "js", "ts", "java", "c", "cpp", "h", "md", "yaml", "yml", "json", "sh", "bash",
    "dockerfile", "html", "css", "sql", "jsx", "tsx", "vue", "rb", "php", "rs",
];

/// Exact file names included regardless of extension
pub const SOURCE_FILE_NAMES: &[&str] = &["Dockerfile"];

/// Files above this size are never included
pub const MAX_FILE_BYTES: u64 = 100 * 1024;

/// Which directories are walked and which files are eligible for the context
#[derive(Debug, Clone)]
pub struct SelectionRules {
    excluded_dirs: HashSet<String>,
    extensions: HashSet<String>,
    file_names: HashSet<String>,
    max_file_bytes: u64,
}

impl Default for SelectionRules {
    fn default() -> Self {
        Self::new(EXCLUDED_DIRS, SOURCE_EXTENSIONS, SOURCE_FILE_NAMES, MAX_FILE_BYTES)
    }
}

impl SelectionRules {
    pub fn new(
        excluded_dirs: &[&str],
        extensions: &[&str],
        file_names: &[&str],
        max_file_bytes: u64,
    ) -> Self {
        Self {
            excluded_dirs: excluded_dirs.iter().map(|d| d.to_string()).collect(),
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            file_names: file_names.iter().map(|n| n.to_string()).collect(),
            max_file_bytes,
        }
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_bytes
    }

    /// Whether a directory with this name should be walked
    pub fn descend_into(&self, dir_name: &str) -> bool {
        !dir_name.starts_with('.') && !self.excluded_dirs.contains(dir_name)
    }

    /// Whether a file with this name and size is eligible
    pub fn accepts_file(&self, file_name: &str, size: u64) -> bool {
        if file_name.starts_with('.') || size > self.max_file_bytes {
            return false;
        }

        if self.file_names.contains(file_name) {
            return true;
        }

        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }
}
