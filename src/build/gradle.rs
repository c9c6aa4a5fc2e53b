use super::{BuildError, BuildOutcome, BuildRunner, LOG_FILE};
use crate::config::MigrationConfig;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

pub const DEFAULT_TASKS: &[&str] = &["clean", "build", "test"];

/// Diagnostic flags passed on every run
pub const DEFAULT_FLAGS: &[&str] = &["--stacktrace", "--info"];

fn wrapper_name() -> &'static str {
    if cfg!(windows) {
        "gradlew.bat"
    } else {
        "gradlew"
    }
}

/// Result of [`ensure_wrapper`]
#[derive(Debug)]
pub enum WrapperStatus {
    Ready(PathBuf),
    /// `gradle wrapper` ran and exited non-zero. It evaluates the build
    /// script, so this is usually a broken `build.gradle`.
    GenerationFailed(BuildOutcome),
}

/// Makes sure `<project_dir>/gradlew` exists, generating it with
/// `gradle wrapper` if needed, and that it is executable
pub async fn ensure_wrapper(
    project_dir: &Path,
    gradle_program: &str,
) -> Result<WrapperStatus, BuildError> {
    let wrapper = project_dir.join(wrapper_name());

    if !wrapper.exists() {
        info!("Gradle wrapper not found, generating");
        let output = Command::new(gradle_program)
            .arg("wrapper")
            .current_dir(project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                BuildError::WrapperUnavailable(format!("cannot run '{}': {}", gradle_program, e))
            })?;

        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "Gradle wrapper generation failed");
            return Ok(WrapperStatus::GenerationFailed(BuildOutcome {
                success: false,
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                log_path: project_dir.join(LOG_FILE),
            }));
        }
        if !wrapper.exists() {
            return Err(BuildError::WrapperUnavailable(format!(
                "'{} wrapper' did not create {}",
                gradle_program,
                wrapper.display()
            )));
        }
    }

    make_executable(&wrapper)?;
    Ok(WrapperStatus::Ready(wrapper))
}

async fn write_log(outcome: &BuildOutcome) -> Result<(), BuildError> {
    tokio::fs::write(&outcome.log_path, outcome.log_contents())
        .await
        .map_err(|source| BuildError::Io {
            path: outcome.log_path.clone(),
            source,
        })?;
    debug!(log = %outcome.log_path.display(), "Build log written");
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), BuildError> {
    use std::os::unix::fs::PermissionsExt;

    let io_err = |source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut permissions = std::fs::metadata(path).map_err(io_err)?.permissions();
    let mode = permissions.mode();
    if mode & 0o111 != 0o111 {
        permissions.set_mode(mode | 0o755);
        std::fs::set_permissions(path, permissions).map_err(io_err)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), BuildError> {
    Ok(())
}

/// Runs the project's Gradle wrapper
#[derive(Debug, Clone)]
pub struct GradleRunner {
    tasks: Vec<String>,
    flags: Vec<String>,
    attempts: u32,
    timeout: Option<Duration>,
    gradle_program: String,
}

impl Default for GradleRunner {
    fn default() -> Self {
        Self {
            tasks: DEFAULT_TASKS.iter().map(|t| t.to_string()).collect(),
            flags: DEFAULT_FLAGS.iter().map(|f| f.to_string()).collect(),
            attempts: 1,
            timeout: None,
            gradle_program: "gradle".to_string(),
        }
    }
}

impl GradleRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks, timeout and per-attempt runs from the migration config
    pub fn from_config(config: &MigrationConfig) -> Self {
        Self::new()
            .with_tasks(config.gradle_tasks.clone())
            .with_timeout(config.build_timeout())
            .with_attempts(config.build_runs)
    }

    pub fn with_tasks(mut self, tasks: Vec<String>) -> Self {
        if !tasks.is_empty() {
            self.tasks = tasks;
        }
        self
    }

    pub fn with_flags(mut self, flags: Vec<String>) -> Self {
        self.flags = flags;
        self
    }

    /// Invocations per [`BuildRunner::run`] call before reporting failure
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program used to generate a missing wrapper
    pub fn with_gradle_program(mut self, program: impl Into<String>) -> Self {
        self.gradle_program = program.into();
        self
    }

    pub fn tasks(&self) -> &[String] {
        &self.tasks
    }

    async fn invoke(&self, wrapper: &Path, project_dir: &Path) -> Result<BuildOutcome, BuildError> {
        let mut command = Command::new(wrapper);
        command
            .args(&self.tasks)
            .args(&self.flags)
            .current_dir(project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let spawn_error = |source| BuildError::Spawn {
            program: wrapper.display().to_string(),
            source,
        };
        let log_path = project_dir.join(LOG_FILE);

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, command.output()).await {
                Ok(result) => result.map_err(spawn_error)?,
                Err(_) => {
                    warn!(seconds = limit.as_secs(), "Gradle build timed out");
                    return Ok(BuildOutcome {
                        success: false,
                        exit_code: None,
                        stdout: String::new(),
                        stderr: format!("Build timed out after {} seconds", limit.as_secs()),
                        log_path,
                    });
                }
            },
            None => command.output().await.map_err(spawn_error)?,
        };

        Ok(BuildOutcome {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            log_path,
        })
    }
}

#[async_trait]
impl BuildRunner for GradleRunner {
    async fn run(&self, project_dir: &Path) -> Result<BuildOutcome, BuildError> {
        let wrapper = match ensure_wrapper(project_dir, &self.gradle_program).await? {
            WrapperStatus::Ready(wrapper) => wrapper,
            WrapperStatus::GenerationFailed(outcome) => {
                write_log(&outcome).await?;
                return Ok(outcome);
            }
        };
        let mut attempt = 1;

        loop {
            info!(
                attempt,
                tasks = %self.tasks.join(" "),
                "Running Gradle build"
            );
            let outcome = self.invoke(&wrapper, project_dir).await?;
            write_log(&outcome).await?;

            if outcome.success {
                info!("Gradle build succeeded");
                return Ok(outcome);
            }

            warn!(
                attempt,
                exit_code = ?outcome.exit_code,
                log = %outcome.log_path.display(),
                "Gradle build failed"
            );
            if attempt >= self.attempts {
                return Ok(outcome);
            }
            attempt += 1;
        }
    }

    fn name(&self) -> &str {
        "gradle"
    }
}
