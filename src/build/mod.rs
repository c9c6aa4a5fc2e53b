//! Gradle build execution
//!
//! A build run returns an explicit [`BuildOutcome`]; callers read the error
//! text from it rather than from shared state.

mod gradle;

pub use gradle::{ensure_wrapper, GradleRunner, WrapperStatus, DEFAULT_FLAGS, DEFAULT_TASKS};

use crate::repair::tail_lines;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const LOG_FILE: &str = "gradle_build.log";

/// Files the wrapper bootstrap adds to a project; committed with the
/// generated build files
pub const WRAPPER_FILES: &[&str] = &[
    "gradlew",
    "gradlew.bat",
    "gradle/wrapper/gradle-wrapper.jar",
    "gradle/wrapper/gradle-wrapper.properties",
];

const STDERR_SEPARATOR: &str = "\n--- STDERR ---\n";

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Gradle wrapper unavailable: {0}")]
    WrapperUnavailable(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of one build invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub success: bool,
    /// `None` when the process was killed or timed out
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

impl BuildOutcome {
    /// Text persisted to the build log: stdout, a separator, then stderr
    pub fn log_contents(&self) -> String {
        format!("{}{}{}", self.stdout, STDERR_SEPARATOR, self.stderr)
    }

    /// Last `lines` lines of the error text (stderr followed by stdout)
    pub fn error_excerpt(&self, lines: usize) -> String {
        tail_lines(&format!("{}\n{}", self.stderr, self.stdout), lines)
    }
}

#[async_trait]
pub trait BuildRunner: Send + Sync {
    /// Runs the configured tasks in `project_dir`. A failing build,
    /// including a failed wrapper bootstrap, is an `Ok` outcome with
    /// `success == false`; `Err` means the tool could not be run at all.
    async fn run(&self, project_dir: &Path) -> Result<BuildOutcome, BuildError>;

    fn name(&self) -> &str;
}
