//! Shared fixtures and scripted collaborators for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use pom2gradle::build::{BuildError, BuildOutcome, BuildRunner};
use pom2gradle::progress::{MigrationEvent, ProgressHandler};
use pom2gradle::repair::{AdvisorError, RepairAdvisor, RepairRequest};
use pom2gradle::scm::{NewPullRequest, PublishError, PullRequest, PullRequestHost, SourceControl};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), target).unwrap();
        }
    }
}

/// Copies a fixture project into a fresh temporary directory
pub fn fixture_project(name: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    copy_dir(&fixture_path(name), dir.path());
    dir
}

/// Build runner that plays back a fixed list of results; runs past the end
/// of the list fail
pub struct ScriptedBuildRunner {
    results: Mutex<VecDeque<bool>>,
    runs: Mutex<u32>,
}

impl ScriptedBuildRunner {
    pub fn new(results: Vec<bool>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            runs: Mutex::new(0),
        }
    }

    pub fn always_failing() -> Self {
        Self::new(Vec::new())
    }

    pub fn runs(&self) -> u32 {
        *self.runs.lock().unwrap()
    }
}

#[async_trait]
impl BuildRunner for ScriptedBuildRunner {
    async fn run(&self, project_dir: &Path) -> Result<BuildOutcome, BuildError> {
        *self.runs.lock().unwrap() += 1;
        let success = self.results.lock().unwrap().pop_front().unwrap_or(false);
        Ok(BuildOutcome {
            success,
            exit_code: Some(if success { 0 } else { 1 }),
            stdout: "> Task :compileJava".to_string(),
            stderr: if success {
                String::new()
            } else {
                "Could not find org.example:missing:1.0".to_string()
            },
            log_path: project_dir.join("gradle_build.log"),
        })
    }

    fn name(&self) -> &str {
        "ScriptedBuildRunner"
    }
}

pub enum AdvisorScript {
    /// Returns the current build file unchanged
    Echo,
    /// Returns queued proposals in order, then echoes
    Proposals(VecDeque<String>),
}

pub struct ScriptedAdvisor {
    script: Mutex<AdvisorScript>,
    requests: Mutex<Vec<RepairRequest>>,
}

impl ScriptedAdvisor {
    pub fn echo() -> Self {
        Self {
            script: Mutex::new(AdvisorScript::Echo),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn proposing(proposals: Vec<&str>) -> Self {
        Self {
            script: Mutex::new(AdvisorScript::Proposals(
                proposals.into_iter().map(str::to_string).collect(),
            )),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RepairRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepairAdvisor for ScriptedAdvisor {
    async fn propose(&self, request: &RepairRequest) -> Result<String, AdvisorError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut script = self.script.lock().unwrap();
        let proposal = match &mut *script {
            AdvisorScript::Echo => None,
            AdvisorScript::Proposals(queue) => queue.pop_front(),
        };
        Ok(proposal.unwrap_or_else(|| request.current_build.clone()))
    }

    fn name(&self) -> &str {
        "ScriptedAdvisor"
    }
}

/// Source control double that records every call. Cloning copies `origin`
/// into the destination.
#[derive(Default)]
pub struct RecordingSourceControl {
    pub origin: Option<PathBuf>,
    pub reject_push: bool,
    pub clones: Mutex<Vec<PathBuf>>,
    pub branches: Mutex<Vec<(String, String)>>,
    pub commits: Mutex<Vec<(Vec<String>, String)>>,
    pub pushes: Mutex<Vec<String>>,
}

#[async_trait]
impl SourceControl for RecordingSourceControl {
    async fn clone_repo(&self, dest: &Path) -> Result<(), PublishError> {
        let origin = self
            .origin
            .as_ref()
            .ok_or_else(|| PublishError::Configuration("no origin".to_string()))?;
        copy_dir(origin, dest);
        self.clones.lock().unwrap().push(dest.to_path_buf());
        Ok(())
    }

    async fn prepare_branch(&self, _repo: &Path, branch: &str, base: &str) -> Result<(), PublishError> {
        self.branches
            .lock()
            .unwrap()
            .push((branch.to_string(), base.to_string()));
        Ok(())
    }

    async fn commit_files(&self, _repo: &Path, files: &[String], message: &str) -> Result<bool, PublishError> {
        self.commits
            .lock()
            .unwrap()
            .push((files.to_vec(), message.to_string()));
        Ok(true)
    }

    async fn push(&self, _repo: &Path, branch: &str) -> Result<(), PublishError> {
        if self.reject_push {
            return Err(PublishError::Conflict(
                "! [rejected] gradle-migration (stale info)".to_string(),
            ));
        }
        self.pushes.lock().unwrap().push(branch.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePullRequestHost {
    pub existing: Option<PullRequest>,
    pub created: Mutex<Vec<NewPullRequest>>,
}

#[async_trait]
impl PullRequestHost for FakePullRequestHost {
    async fn find_open(&self, _head: &str, _base: &str) -> Result<Option<PullRequest>, PublishError> {
        Ok(self.existing.clone())
    }

    async fn create(&self, request: &NewPullRequest) -> Result<PullRequest, PublishError> {
        let mut created = self.created.lock().unwrap();
        created.push(request.clone());
        Ok(PullRequest {
            number: created.len() as u64 + 100,
            html_url: format!("https://github.com/acme/shop/pull/{}", created.len() + 100),
            title: request.title.clone(),
        })
    }
}

/// Keeps the kind of every progress event
#[derive(Default)]
pub struct RecordingProgress {
    pub events: Mutex<Vec<String>>,
}

impl ProgressHandler for RecordingProgress {
    fn on_progress(&self, event: &MigrationEvent) {
        let label = match event {
            MigrationEvent::Started { .. } => "started".to_string(),
            MigrationEvent::StepStarted { step } => format!("start:{}", step),
            MigrationEvent::StepCompleted { step, .. } => format!("done:{}", step),
            MigrationEvent::BuildAttempt { attempt, .. } => format!("build:{}", attempt),
            MigrationEvent::RepairProposed { changed, .. } => format!("repair:{}", changed),
            MigrationEvent::Completed { .. } => "completed".to_string(),
            MigrationEvent::Failed { step, .. } => format!("failed:{}", step),
        };
        self.events.lock().unwrap().push(label);
    }
}
