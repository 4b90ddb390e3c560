use crate::context::ContextBundle;

pub const CODE_FILES_HEADER: &str = "=== Code Files ===\n";

/// Full prompt text: instruction, optional git block, then the code files
pub fn build_prompt(instruction: &str, git_context: Option<&str>, bundle: &ContextBundle) -> String {
    let code = if bundle.is_empty() {
        String::new()
    } else {
        bundle.render()
    };

    let git_len = git_context.map_or(0, str::len);
    let mut prompt =
        String::with_capacity(instruction.len() + git_len + code.len() + CODE_FILES_HEADER.len() + 3);

    prompt.push_str(instruction);
    prompt.push_str("\n\n");

    if let Some(git) = git_context.filter(|g| !g.is_empty()) {
        prompt.push_str(git);
        prompt.push('\n');
    }

    if !code.is_empty() {
        prompt.push_str(CODE_FILES_HEADER);
        prompt.push_str(&code);
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextFile, Truncation};

    fn bundle_with(path: &str, content: &str) -> ContextBundle {
        ContextBundle {
            files: vec![ContextFile {
                path: path.to_string(),
                content: content.to_string(),
                size: content.len(),
            }],
            total_bytes: content.len(),
            truncation: None,
        }
    }

    #[test]
    fn test_instruction_only() {
        let prompt = build_prompt("describe this", None, &ContextBundle::default());
        assert_eq!(prompt, "describe this\n\n");
    }

    #[test]
    fn test_with_code_files() {
        let prompt = build_prompt("describe this", None, &bundle_with("main.go", "package main"));
        assert_eq!(
            prompt,
            "describe this\n\n=== Code Files ===\n\n--- File: main.go ---\npackage main\n"
        );
    }

    #[test]
    fn test_git_context_comes_before_code() {
        let git = "=== Git Commit Information ===\nCommit: abc\n";
        let prompt = build_prompt("review", Some(git), &bundle_with("a.rs", "fn a() {}"));

        let git_at = prompt.find("=== Git Commit Information ===").unwrap();
        let code_at = prompt.find(CODE_FILES_HEADER).unwrap();
        assert!(prompt.starts_with("review\n\n"));
        assert!(git_at < code_at);
    }

    #[test]
    fn test_empty_git_context_is_skipped() {
        let prompt = build_prompt("review", Some(""), &ContextBundle::default());
        assert_eq!(prompt, "review\n\n");
    }

    #[test]
    fn test_truncation_only_bundle_still_rendered() {
        let bundle = ContextBundle {
            files: Vec::new(),
            total_bytes: 0,
            truncation: Some(Truncation::MaxBytes(10)),
        };
        let prompt = build_prompt("review", None, &bundle);
        assert!(prompt.contains(CODE_FILES_HEADER));
        assert!(prompt.contains("max context size of 10 bytes"));
    }
}
