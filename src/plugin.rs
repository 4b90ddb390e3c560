use crate::config::Settings;
use crate::context::{ContextAssembler, ContextLimits, SelectionRules};
use crate::error::AppResult;
use crate::git::{ChangeSet, RepoIntrospector, Repository, build_git_context};
use crate::llm::{GeminiClient, GenerativeClient, UsageReport, prompt};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub text: String,
    pub usage: UsageReport,
}

/// One analysis run: context in, generated text and cost out
pub struct Plugin {
    settings: Settings,
    client: Box<dyn GenerativeClient>,
    introspector: Box<dyn RepoIntrospector>,
    assembler: ContextAssembler,
}

impl Plugin {
    /// Wire the production collaborators for `settings`
    pub fn new(settings: Settings) -> AppResult<Self> {
        let client = GeminiClient::from_settings(&settings)?;
        Ok(Self::with_client(settings, Box::new(client)))
    }

    pub fn with_client(settings: Settings, client: Box<dyn GenerativeClient>) -> Self {
        let introspector = Box::new(Repository::new(git_dir_for(&settings.target)));
        let assembler = ContextAssembler::new(
            SelectionRules::default(),
            ContextLimits {
                max_files: settings.max_files,
                max_bytes: settings.max_context_size,
            },
        );

        Self {
            settings,
            client,
            introspector,
            assembler,
        }
    }

    pub fn with_introspector(mut self, introspector: Box<dyn RepoIntrospector>) -> Self {
        self.introspector = introspector;
        self
    }

    pub fn with_assembler(mut self, assembler: ContextAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Validate, gather context, and run the generation call
    pub async fn exec(&self) -> AppResult<Analysis> {
        self.settings.validate()?;

        let prompt = self.build_prompt()?;
        let generation = self.client.generate(&prompt).await?;

        tracing::info!(
            input_tokens = generation.usage.input_tokens,
            output_tokens = generation.usage.output_tokens,
            total_cost = generation.usage.total_cost,
            "analysis complete"
        );

        Ok(Analysis {
            text: generation.text,
            usage: generation.usage,
        })
    }

    /// The full prompt this run sends
    pub fn build_prompt(&self) -> AppResult<String> {
        let (git_context, changed) = if self.settings.git_diff {
            self.git_context()
        } else {
            (None, None)
        };

        tracing::debug!(path = %self.settings.target.display(), "building context");
        let bundle = self.assembler.assemble(&self.settings.target, changed.as_ref())?;
        if bundle.truncation.is_some() {
            tracing::info!(files = bundle.files.len(), "context truncated");
        }

        Ok(prompt::build_prompt(
            &self.settings.prompt,
            git_context.as_deref(),
            &bundle,
        ))
    }

    /// Git block and target-relative change set; both absent on any failure
    fn git_context(&self) -> (Option<String>, Option<ChangeSet>) {
        if !self.introspector.is_repository() {
            tracing::warn!("target is not a git repository, continuing without git context");
            return (None, None);
        }

        let Some(commit) = self.introspector.resolve_commit(&self.settings.git_commit_sha) else {
            tracing::warn!("no commit could be determined, continuing without git context");
            return (None, None);
        };

        let context = build_git_context(self.introspector.as_ref(), &commit);

        let changed = context.changed.map(|set| {
            let prefix = self.introspector.path_prefix().unwrap_or_default();
            let set = set.relative_to(&prefix);
            tracing::debug!(commit = %commit, changed = set.len(), "prioritizing changed files");
            set
        });

        (Some(context.text).filter(|c| !c.is_empty()), changed)
    }
}

/// Directory git runs in for `target`; a file target uses its parent
fn git_dir_for(target: &Path) -> PathBuf {
    if target.is_file() {
        match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    } else {
        target.to_path_buf()
    }
}
