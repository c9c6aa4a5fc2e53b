use super::{MigrationReport, MigrationSettings, MigrationState, ProjectConversion, Workspace};
use crate::build::{BuildRunner, WRAPPER_FILES};
use crate::gradle::{write_fixed, MainClassLocator, SourceScanLocator, BUILD_FILE};
use crate::maven::POM_FILE;
use crate::progress::{MigrationEvent, NoOpHandler, ProgressHandler};
use crate::repair::{RepairAdvisor, RepairRequest};
use crate::scm::{ensure_pull_request, NewPullRequest, PullRequestHost, SourceControl};
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Runs a migration: clone, branch, translate, write, build with repairs,
/// publish
pub struct MigrationOrchestrator {
    build_runner: Arc<dyn BuildRunner>,
    advisor: Arc<dyn RepairAdvisor>,
    locator: Arc<dyn MainClassLocator>,
    progress: Arc<dyn ProgressHandler>,
    source_control: Option<Arc<dyn SourceControl>>,
    pull_requests: Option<Arc<dyn PullRequestHost>>,
    settings: MigrationSettings,
}

impl MigrationOrchestrator {
    pub fn new(build_runner: Arc<dyn BuildRunner>, advisor: Arc<dyn RepairAdvisor>) -> Self {
        Self {
            build_runner,
            advisor,
            locator: Arc::new(SourceScanLocator::new()),
            progress: Arc::new(NoOpHandler),
            source_control: None,
            pull_requests: None,
            settings: MigrationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: MigrationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_locator(mut self, locator: Arc<dyn MainClassLocator>) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    /// Enables the branch step, plus cloning for [`Workspace::remote`]
    pub fn with_source_control(mut self, source_control: Arc<dyn SourceControl>) -> Self {
        self.source_control = Some(source_control);
        self
    }

    /// Enables publishing; also needs a source control backend
    pub fn with_pull_request_host(mut self, host: Arc<dyn PullRequestHost>) -> Self {
        self.pull_requests = Some(host);
        self
    }

    pub fn settings(&self) -> &MigrationSettings {
        &self.settings
    }

    /// Runs the whole workflow. Failures end the run early and are reported
    /// as [`MigrationState::Failed`].
    pub async fn run(&self, workspace: &Workspace) -> MigrationReport {
        let start = Instant::now();
        let mut report = MigrationReport::default();

        info!(project = %workspace.dir.display(), "Starting Maven to Gradle migration");
        self.progress.on_progress(&MigrationEvent::Started {
            project: workspace.dir.display().to_string(),
        });

        match self.execute(workspace, &mut report).await {
            Ok(()) => {
                report.state = MigrationState::Done;
                info!(
                    build_attempts = report.build_attempts,
                    repairs = report.repairs_applied,
                    "Migration complete"
                );
                self.progress.on_progress(&MigrationEvent::Completed {
                    build_attempts: report.build_attempts,
                    total_time: start.elapsed(),
                });
            }
            Err(err) => {
                let reason = format!("{:#}", err);
                let step = report.state.to_string();
                error!(step = %step, error = %reason, "Migration failed");
                self.progress.on_progress(&MigrationEvent::Failed {
                    step,
                    error: reason.clone(),
                });
                report.state = MigrationState::Failed(reason);
            }
        }

        report
    }

    async fn execute(&self, workspace: &Workspace, report: &mut MigrationReport) -> Result<()> {
        let root = workspace.dir.as_path();

        if workspace.clone {
            let scm = self
                .source_control
                .as_ref()
                .context("Cloning requires a source control backend")?;
            let started = self.enter(report, MigrationState::Clone);
            scm.clone_repo(root)
                .await
                .context("Failed to clone repository")?;
            self.leave(report, started);
        }

        if let Some(scm) = &self.source_control {
            let started = self.enter(report, MigrationState::Branch);
            scm.prepare_branch(root, &self.settings.feature_branch, &self.settings.base_branch)
                .await
                .with_context(|| {
                    format!("Failed to prepare branch {}", self.settings.feature_branch)
                })?;
            self.leave(report, started);
        }

        let started = self.enter(report, MigrationState::Translate);
        let conversion = ProjectConversion::plan(
            root,
            self.settings.main_class.as_deref(),
            self.locator.as_ref(),
        )?;
        report.skipped_modules = conversion.skipped.clone();
        self.leave(report, started);

        let started = self.enter(report, MigrationState::Write);
        report.generated_files = conversion.write()?;
        self.leave(report, started);

        self.build_until_green(root, report).await?;

        if let (Some(scm), Some(host)) = (&self.source_control, &self.pull_requests) {
            let started = self.enter(report, MigrationState::Publish);
            self.publish(root, scm.as_ref(), host.as_ref(), report)
                .await?;
            self.leave(report, started);
        } else {
            debug!("No publisher configured, leaving changes in the working tree");
        }

        Ok(())
    }

    fn enter(&self, report: &mut MigrationReport, state: MigrationState) -> Instant {
        info!(step = %state, "Step started");
        self.progress.on_progress(&MigrationEvent::StepStarted {
            step: state.to_string(),
        });
        report.state = state;
        Instant::now()
    }

    fn leave(&self, report: &MigrationReport, started: Instant) {
        self.progress.on_progress(&MigrationEvent::StepCompleted {
            step: report.state.to_string(),
            duration: started.elapsed(),
        });
    }

    /// Builds, asking the advisor for a new root build file after each
    /// failure, until the build passes or the attempt bound is reached
    async fn build_until_green(&self, root: &Path, report: &mut MigrationReport) -> Result<()> {
        let max_attempts = self.settings.max_build_attempts.max(1);
        let build_file = root.join(BUILD_FILE);

        loop {
            let started = self.enter(report, MigrationState::Build);
            report.build_attempts += 1;
            let attempt = report.build_attempts;

            info!(attempt, max_attempts, runner = self.build_runner.name(), "Running build");
            self.progress.on_progress(&MigrationEvent::BuildAttempt {
                attempt,
                max_attempts,
            });

            let outcome = self
                .build_runner
                .run(root)
                .await
                .context("Failed to run the build")?;
            self.leave(report, started);

            if outcome.success {
                info!(attempt, "Build succeeded");
                return Ok(());
            }
            warn!(attempt, exit_code = ?outcome.exit_code, log = %outcome.log_path.display(), "Build failed");

            if attempt >= max_attempts {
                return Err(anyhow!("Build still failing after {} attempt(s)", attempt));
            }

            let started = self.enter(report, MigrationState::Repair);
            let current = tokio::fs::read_to_string(&build_file)
                .await
                .with_context(|| format!("Failed to read {}", build_file.display()))?;
            let source = tokio::fs::read_to_string(root.join(POM_FILE))
                .await
                .context("Failed to read root pom.xml")?;

            let request = RepairRequest {
                source_descriptor: source,
                current_build: current.clone(),
                error_excerpt: outcome.error_excerpt(self.settings.error_tail_lines),
            };

            let proposal = match self.advisor.propose(&request).await {
                Ok(proposal) => proposal,
                Err(err) => {
                    warn!(error = %err, advisor = self.advisor.name(), "No fix produced");
                    return Err(anyhow!("No fix produced: {}", err));
                }
            };

            let changed = proposal.trim() != current.trim();
            self.progress
                .on_progress(&MigrationEvent::RepairProposed { attempt, changed });
            if !changed {
                return Err(anyhow!(
                    "Repair advisor proposed no change after build attempt {}",
                    attempt
                ));
            }

            write_fixed(&build_file, &proposal, self.settings.retention)
                .with_context(|| format!("Failed to write {}", build_file.display()))?;
            report.repairs_applied += 1;
            self.leave(report, started);
        }
    }

    async fn publish(
        &self,
        root: &Path,
        scm: &dyn SourceControl,
        host: &dyn PullRequestHost,
        report: &mut MigrationReport,
    ) -> Result<()> {
        let mut files = report.generated_files.clone();
        files.extend(WRAPPER_FILES.iter().map(|f| f.to_string()));

        let committed = scm
            .commit_files(root, &files, &self.settings.commit_message)
            .await
            .context("Failed to commit generated files")?;
        if !committed {
            info!("Generated files unchanged, nothing new to commit");
        }

        scm.push(root, &self.settings.feature_branch)
            .await
            .with_context(|| format!("Failed to push {}", self.settings.feature_branch))?;

        let request = NewPullRequest::migration(
            self.settings.feature_branch.clone(),
            self.settings.base_branch.clone(),
        );
        let outcome = ensure_pull_request(host, &request)
            .await
            .context("Failed to open pull request")?;
        info!(url = %outcome.pull_request().html_url, "Pull request ready");
        report.pull_request = Some(outcome);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{BuildError, BuildOutcome};
    use crate::repair::AdvisorError;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const POM: &str = r#"<project xmlns="http://maven.apache.org/POM/4.0.0">
  <groupId>com.example</groupId>
  <artifactId>demo</artifactId>
  <version>1.0.0</version>
  <dependencies>
    <dependency>
      <groupId>org.springframework.boot</groupId>
      <artifactId>spring-boot-starter-web</artifactId>
    </dependency>
  </dependencies>
</project>"#;

    struct ScriptedRunner {
        results: Mutex<Vec<bool>>,
    }

    #[async_trait]
    impl BuildRunner for ScriptedRunner {
        async fn run(&self, project_dir: &Path) -> Result<BuildOutcome, BuildError> {
            let success = self.results.lock().unwrap().remove(0);
            Ok(BuildOutcome {
                success,
                exit_code: Some(if success { 0 } else { 1 }),
                stdout: String::new(),
                stderr: "Could not resolve dependency".to_string(),
                log_path: project_dir.join("gradle_build.log"),
            })
        }

        fn name(&self) -> &str {
            "ScriptedRunner"
        }
    }

    struct FailingAdvisor;

    #[async_trait]
    impl RepairAdvisor for FailingAdvisor {
        async fn propose(&self, _request: &RepairRequest) -> Result<String, AdvisorError> {
            Err(AdvisorError::Unavailable {
                attempts: 3,
                last_error: "timeout".to_string(),
            })
        }

        fn name(&self) -> &str {
            "FailingAdvisor"
        }
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(POM_FILE), POM).unwrap();
        dir
    }

    fn orchestrator(results: Vec<bool>) -> MigrationOrchestrator {
        MigrationOrchestrator::new(
            Arc::new(ScriptedRunner {
                results: Mutex::new(results),
            }),
            Arc::new(FailingAdvisor),
        )
    }

    #[tokio::test]
    async fn test_local_run_writes_files() {
        let dir = project();

        let report = orchestrator(vec![true])
            .run(&Workspace::local(dir.path()))
            .await;

        assert_eq!(report.state, MigrationState::Done);
        assert_eq!(report.build_attempts, 1);
        assert_eq!(
            report.generated_files,
            vec!["build.gradle", "settings.gradle", ".gitignore"]
        );
        assert!(report.pull_request.is_none());

        let build = fs::read_to_string(dir.path().join(BUILD_FILE)).unwrap();
        assert!(build.contains("implementation 'org.springframework.boot:spring-boot-starter-web:3.2.5'"));
    }

    #[tokio::test]
    async fn test_advisor_error_fails_the_run() {
        let dir = project();

        let report = orchestrator(vec![false, true])
            .run(&Workspace::local(dir.path()))
            .await;

        assert_eq!(report.build_attempts, 1);
        match report.state {
            MigrationState::Failed(reason) => assert!(reason.contains("No fix produced")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    /// Proposes a fixed build file and keeps every request
    #[cfg(unix)]
    struct FixedAdvisor {
        proposal: &'static str,
        requests: Mutex<Vec<RepairRequest>>,
    }

    #[cfg(unix)]
    #[async_trait]
    impl RepairAdvisor for FixedAdvisor {
        async fn propose(&self, request: &RepairRequest) -> Result<String, AdvisorError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.proposal.to_string())
        }

        fn name(&self) -> &str {
            "FixedAdvisor"
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_wrapper_bootstrap_goes_to_repair() {
        use crate::build::{GradleRunner, LOG_FILE};
        use std::os::unix::fs::PermissionsExt;

        let dir = project();
        let tools = TempDir::new().unwrap();
        let gradle = tools.path().join("gradle");
        fs::write(
            &gradle,
            "#!/bin/sh\n\
             if grep -q repaired build.gradle; then\n\
             printf '#!/bin/sh\\nexit 0\\n' > gradlew\n\
             exit 0\n\
             fi\n\
             echo \"Plugin [id: 'org.springframework.boot'] was not found\" >&2\n\
             exit 1\n",
        )
        .unwrap();
        fs::set_permissions(&gradle, fs::Permissions::from_mode(0o755)).unwrap();

        let runner = GradleRunner::new().with_gradle_program(gradle.to_str().unwrap());
        let advisor = Arc::new(FixedAdvisor {
            proposal: "// repaired\nplugins {\n    id 'java'\n}\n",
            requests: Mutex::new(Vec::new()),
        });

        let report = MigrationOrchestrator::new(Arc::new(runner), advisor.clone())
            .run(&Workspace::local(dir.path()))
            .await;

        assert_eq!(report.state, MigrationState::Done);
        assert_eq!(report.build_attempts, 2);
        assert_eq!(report.repairs_applied, 1);

        let requests = advisor.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].error_excerpt.contains("was not found"));
        assert!(requests[0].current_build.contains("spring-boot-starter-web"));
        assert!(dir.path().join(LOG_FILE).is_file());
    }

    #[tokio::test]
    async fn test_missing_root_pom_fails_before_writing() {
        let dir = TempDir::new().unwrap();

        let report = orchestrator(vec![true])
            .run(&Workspace::local(dir.path()))
            .await;

        assert!(report.state.is_failed());
        assert_eq!(report.build_attempts, 0);
        assert!(!dir.path().join(BUILD_FILE).exists());
    }

    #[tokio::test]
    async fn test_clone_without_source_control_fails() {
        let dir = project();

        let report = orchestrator(vec![true])
            .run(&Workspace::remote(dir.path()))
            .await;

        assert!(report.state.is_failed());
    }

    #[tokio::test]
    async fn test_main_class_override_applies_to_root() {
        let dir = project();
        let settings = MigrationSettings {
            main_class: Some("com.example.App".to_string()),
            ..MigrationSettings::default()
        };

        let report = orchestrator(vec![true])
            .with_settings(settings)
            .run(&Workspace::local(dir.path()))
            .await;

        assert_eq!(report.state, MigrationState::Done);
        let build = fs::read_to_string(dir.path().join(BUILD_FILE)).unwrap();
        assert!(build.contains("mainClass = 'com.example.App'"));
    }
}
