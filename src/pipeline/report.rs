use crate::scm::PullRequestOutcome;
use serde::Serialize;
use std::fmt;

/// Workflow position; `Done` and `Failed` are terminal
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum MigrationState {
    #[default]
    Clone,
    Branch,
    Translate,
    Write,
    Build,
    Repair,
    Publish,
    Done,
    Failed(String),
}

impl MigrationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MigrationState::Done | MigrationState::Failed(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, MigrationState::Failed(_))
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationState::Clone => "clone",
            MigrationState::Branch => "branch",
            MigrationState::Translate => "translate",
            MigrationState::Write => "write",
            MigrationState::Build => "build",
            MigrationState::Repair => "repair",
            MigrationState::Publish => "publish",
            MigrationState::Done => "done",
            MigrationState::Failed(_) => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    pub state: MigrationState,
    /// Build runs performed
    pub build_attempts: u32,
    pub repairs_applied: u32,
    pub pull_request: Option<PullRequestOutcome>,
    /// Written files, relative to the project root
    pub generated_files: Vec<String>,
    /// Declared modules without a `pom.xml`
    pub skipped_modules: Vec<String>,
}

impl MigrationReport {
    pub fn succeeded(&self) -> bool {
        self.state == MigrationState::Done
    }

    /// One-line human-readable status
    pub fn summary(&self) -> String {
        match &self.state {
            MigrationState::Done => match &self.pull_request {
                Some(PullRequestOutcome::Created(pr)) => {
                    format!("Migration complete, pull request created: {}", pr.html_url)
                }
                Some(PullRequestOutcome::Existing(pr)) => {
                    format!("Migration complete, pull request already open: {}", pr.html_url)
                }
                None => format!(
                    "Migration complete after {} build attempt(s)",
                    self.build_attempts
                ),
            },
            MigrationState::Failed(reason) => format!("Migration failed: {}", reason),
            other => format!("Migration stopped at {}", other),
        }
    }
}
