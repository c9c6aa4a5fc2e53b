use super::{PublishError, SourceControl};
use async_trait::async_trait;
use reqwest::Url;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// `https://<user>:<token>@<host>/<owner>/<repo>.git` with both credentials
/// percent-encoded
pub fn authenticated_url(
    host: &str,
    username: &str,
    token: &str,
    owner: &str,
    repo: &str,
) -> Result<String, PublishError> {
    let invalid = |what: &str| PublishError::Configuration(format!("invalid {} for remote URL", what));

    let mut url = Url::parse(host).map_err(|_| invalid("host"))?;
    url.set_username(username).map_err(|_| invalid("username"))?;
    url.set_password(Some(token)).map_err(|_| invalid("token"))?;
    url.set_path(&format!("{}/{}.git", owner, repo));
    Ok(url.to_string())
}

const REMOTE: &str = "origin";

/// Standard output of a successful git invocation
struct GitOutput {
    stdout: String,
}

/// [`SourceControl`] over the `git` command line
#[derive(Clone)]
pub struct GitCli {
    remote_url: Option<String>,
    author: Option<(String, String)>,
    program: String,
}

impl std::fmt::Debug for GitCli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitCli")
            .field("remote_url", &self.remote_url.as_ref().map(|_| "<redacted>"))
            .field("author", &self.author)
            .field("program", &self.program)
            .finish()
    }
}

impl GitCli {
    /// `remote_url` may carry credentials; it is never logged
    pub fn new(remote_url: Option<String>) -> Self {
        Self {
            remote_url,
            author: None,
            program: "git".to_string(),
        }
    }

    /// Identity used for commits, overriding the user's git config
    pub fn with_author(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.author = Some((name.into(), email.into()));
        self
    }

    fn describe(&self, args: &[&str]) -> String {
        args.iter()
            .map(|arg| match &self.remote_url {
                Some(url) if *arg == url.as_str() => "<remote>",
                _ => *arg,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn git(&self, dir: &Path, args: &[&str]) -> Result<GitOutput, PublishError> {
        let command = self.describe(args);
        debug!(command = %command, "Running git");

        let mut cmd = Command::new(&self.program);
        if let Some((name, email)) = &self.author {
            cmd.arg("-c")
                .arg(format!("user.name={}", name))
                .arg("-c")
                .arg(format!("user.email={}", email));
        }
        let output = cmd
            .args(args)
            .current_dir(dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| PublishError::Git {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if output.status.success() {
            Ok(GitOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            })
        } else {
            let mut message = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if let Some(url) = &self.remote_url {
                message = message.replace(url.as_str(), "<remote>");
            }
            Err(PublishError::Git { command, message })
        }
    }

    async fn ref_exists(&self, repo: &Path, reference: &str) -> bool {
        self.git(repo, &["rev-parse", "--verify", "--quiet", reference])
            .await
            .is_ok()
    }
}

fn is_push_rejection(message: &str) -> bool {
    ["[rejected]", "non-fast-forward", "stale info", "fetch first"]
        .iter()
        .any(|marker| message.contains(marker))
}

#[async_trait]
impl SourceControl for GitCli {
    async fn clone_repo(&self, dest: &Path) -> Result<(), PublishError> {
        let url = self
            .remote_url
            .as_deref()
            .ok_or_else(|| PublishError::Configuration("no remote repository URL".to_string()))?;

        if dest.exists() {
            warn!(path = %dest.display(), "Clone destination exists, deleting");
            tokio::fs::remove_dir_all(dest)
                .await
                .map_err(|e| PublishError::Git {
                    command: "clone".to_string(),
                    message: format!("cannot remove {}: {}", dest.display(), e),
                })?;
        }

        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            return Err(PublishError::Git {
                command: "clone".to_string(),
                message: format!("cannot create {}: {}", parent.display(), e),
            });
        }

        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                PublishError::Configuration(format!("invalid clone destination {}", dest.display()))
            })?;
        info!(path = %dest.display(), "Cloning repository");
        self.git(parent, &["clone", url, &name]).await?;
        Ok(())
    }

    async fn prepare_branch(&self, repo: &Path, branch: &str, base: &str) -> Result<(), PublishError> {
        self.git(repo, &["fetch", REMOTE]).await?;

        let remote_branch = format!("{}/{}", REMOTE, branch);
        let remote_base = format!("{}/{}", REMOTE, base);

        if self.ref_exists(repo, &format!("refs/remotes/{}", remote_branch)).await {
            info!(branch, "Branch exists remotely, checking out and rebasing");
            self.git(repo, &["checkout", "-B", branch, &remote_branch]).await?;

            if let Err(err) = self.git(repo, &["rebase", &remote_base]).await {
                warn!(branch, base, error = %err, "Rebase failed, keeping the remote branch as is");
                if let Err(abort_err) = self.git(repo, &["rebase", "--abort"]).await {
                    debug!(error = %abort_err, "No rebase to abort");
                }
            }
        } else if self.ref_exists(repo, &format!("refs/remotes/{}", remote_base)).await {
            info!(branch, base, "Creating branch from base");
            self.git(repo, &["checkout", "-B", branch, &remote_base]).await?;
        } else {
            info!(branch, "Creating branch from current HEAD");
            self.git(repo, &["checkout", "-B", branch]).await?;
        }
        Ok(())
    }

    async fn commit_files(&self, repo: &Path, files: &[String], message: &str) -> Result<bool, PublishError> {
        let present: Vec<&str> = files
            .iter()
            .filter(|f| {
                let exists = repo.join(f.as_str()).exists();
                if !exists {
                    warn!(file = %f, "File not found, not committing it");
                }
                exists
            })
            .map(String::as_str)
            .collect();

        if present.is_empty() {
            warn!("No files to commit");
            return Ok(false);
        }

        let mut add = vec!["add", "--"];
        add.extend(&present);
        self.git(repo, &add).await?;

        let mut staged = vec!["diff", "--cached", "--name-only", "--"];
        staged.extend(&present);
        if self.git(repo, &staged).await?.stdout.trim().is_empty() {
            info!("Nothing changed in the listed files");
            return Ok(false);
        }

        let mut commit = vec!["commit", "-m", message, "--"];
        commit.extend(&present);
        self.git(repo, &commit).await?;
        info!(files = ?present, "Committed");
        Ok(true)
    }

    async fn push(&self, repo: &Path, branch: &str) -> Result<(), PublishError> {
        info!(branch, "Pushing branch");
        match self
            .git(repo, &["push", "--set-upstream", "--force-with-lease", REMOTE, branch])
            .await
        {
            Ok(_) => Ok(()),
            Err(PublishError::Git { message, .. }) if is_push_rejection(&message) => {
                Err(PublishError::Conflict(message))
            }
            Err(err) => Err(err),
        }
    }
}
