use crate::config::MigrationConfig;
use crate::gradle::RetentionPolicy;
use std::path::PathBuf;

pub const DEFAULT_COMMIT_MESSAGE: &str = "Migrate build from Maven to Gradle";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationSettings {
    pub feature_branch: String,
    pub base_branch: String,
    /// Total build runs, the first one included
    pub max_build_attempts: u32,
    pub error_tail_lines: usize,
    pub retention: RetentionPolicy,
    pub commit_message: String,
    /// Main class for the root project, overriding discovery
    pub main_class: Option<String>,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            feature_branch: "gradle-migration".to_string(),
            base_branch: "main".to_string(),
            max_build_attempts: 3,
            error_tail_lines: 300,
            retention: RetentionPolicy::SourceControlOnly,
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            main_class: None,
        }
    }
}

impl MigrationSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_build_attempts(mut self, attempts: u32) -> Self {
        self.max_build_attempts = attempts;
        self
    }

    pub fn with_branches(mut self, feature: impl Into<String>, base: impl Into<String>) -> Self {
        self.feature_branch = feature.into();
        self.base_branch = base.into();
        self
    }

    pub fn with_main_class(mut self, main_class: Option<String>) -> Self {
        self.main_class = main_class;
        self
    }
}

impl From<&MigrationConfig> for MigrationSettings {
    fn from(config: &MigrationConfig) -> Self {
        Self {
            feature_branch: config.feature_branch.clone(),
            base_branch: config.base_branch.clone(),
            max_build_attempts: config.max_build_attempts,
            error_tail_lines: config.error_tail_lines,
            retention: RetentionPolicy::from_generations(config.backup_generations),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            main_class: None,
        }
    }
}

/// Where the migration happens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub dir: PathBuf,
    /// Clone the remote into `dir` first
    pub clone: bool,
}

impl Workspace {
    /// An existing checkout
    pub fn local(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            clone: false,
        }
    }

    /// A fresh clone of the configured remote into `dir`
    pub fn remote(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            clone: true,
        }
    }
}
