pub mod executor;
pub mod introspector;
pub mod parser;
pub mod repository;

// Re-export commonly used types
pub use executor::{CommandOutput, GitExecutor};
pub use introspector::{ChangeSet, GitContext, RepoIntrospector, build_git_context, resolve_commit_from};
pub use parser::{CommitInfo, parse_commit_info, parse_name_only};
pub use repository::Repository;
