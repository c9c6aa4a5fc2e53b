//! Configuration management for pom2gradle
//!
//! Settings are loaded from environment variables with defaults; CLI flags
//! override individual fields afterwards.
//!
//! # Environment Variables
//!
//! ## Migration
//! - `POM2GRADLE_PROVIDER`: LLM provider (ollama|openai|claude|gemini|grok|groq) - default: "openai"
//! - `POM2GRADLE_MODEL`: model name - default depends on the provider
//! - `POM2GRADLE_REQUEST_TIMEOUT`: LLM/API timeout in seconds - default: "120"
//! - `POM2GRADLE_API_BASE_URL`: custom LLM endpoint (OpenAI-compatible servers, proxies)
//! - `POM2GRADLE_MAX_BUILD_ATTEMPTS`: total build runs before giving up - default: "3"
//! - `POM2GRADLE_ERROR_TAIL_LINES`: build log lines sent to the repair advisor - default: "300"
//! - `POM2GRADLE_GRADLE_TASKS`: whitespace-separated task list - default: "clean build test"
//! - `POM2GRADLE_BUILD_TIMEOUT`: limit for one Gradle invocation in seconds, 0 disables - default: "1800"
//! - `POM2GRADLE_BUILD_RUNS`: Gradle invocations per build attempt, for flaky builds - default: "1"
//! - `POM2GRADLE_BACKUP_GENERATIONS`: repaired build files to keep as `.bak.N` - default: "0"
//! - `POM2GRADLE_LOG_LEVEL`: logging level - default: "info"
//!
//! ## GitHub
//! - `GITHUB_USERNAME`, `GITHUB_TOKEN`, `GITHUB_REPO_OWNER`, `GITHUB_REPO_NAME`
//! - `FEATURE_BRANCH_NAME` - default: "gradle-migration"
//! - `BASE_BRANCH_NAME` - default: "main"
//! - `GITHUB_API_URL` - default: "https://api.github.com"
//! - `GITHUB_SERVER_URL` - default: "https://github.com"
//!
//! Provider API keys are read by genai itself (`OPENAI_API_KEY`,
//! `ANTHROPIC_API_KEY`, `GEMINI_API_KEY`, `XAI_API_KEY`, `GROQ_API_KEY`;
//! Ollama needs none).

use crate::llm::{BackendError, GenAIClient, LLMClient};
use genai::adapter::AdapterKind;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_BUILD_ATTEMPTS: u32 = 3;
const DEFAULT_ERROR_TAIL_LINES: usize = 300;
const DEFAULT_GRADLE_TASKS: &str = "clean build test";
const DEFAULT_BUILD_TIMEOUT_SECS: u64 = 1800;
const DEFAULT_BUILD_RUNS: u32 = 1;
const DEFAULT_FEATURE_BRANCH: &str = "gradle-migration";
const DEFAULT_BASE_BRANCH: &str = "main";
const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_GITHUB_SERVER_URL: &str = "https://github.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid provider: {0}. Valid options: ollama, openai, claude, gemini, grok, groq")]
    InvalidProvider(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Missing credential: set {0}")]
    MissingCredential(&'static str),

    #[error("Backend initialization failed: {0}")]
    Backend(#[from] BackendError),
}

/// Maps a provider name to its genai adapter
pub fn parse_provider(name: &str) -> Result<AdapterKind, ConfigError> {
    match name.trim().to_lowercase().as_str() {
        "ollama" => Ok(AdapterKind::Ollama),
        "openai" => Ok(AdapterKind::OpenAI),
        "claude" | "anthropic" => Ok(AdapterKind::Anthropic),
        "gemini" => Ok(AdapterKind::Gemini),
        "grok" | "xai" => Ok(AdapterKind::Xai),
        "groq" => Ok(AdapterKind::Groq),
        _ => Err(ConfigError::InvalidProvider(name.to_string())),
    }
}

/// Model used when none is configured
pub fn default_model(provider: AdapterKind) -> &'static str {
    match provider {
        AdapterKind::Ollama => "qwen2.5-coder:7b",
        AdapterKind::Anthropic => "claude-3-5-sonnet-latest",
        AdapterKind::Gemini => "gemini-1.5-pro",
        AdapterKind::Xai => "grok-2",
        AdapterKind::Groq => "llama-3.3-70b-versatile",
        _ => "gpt-4o",
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_nonempty(key)
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Settings for one migration run
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub provider: AdapterKind,
    pub model: String,
    pub request_timeout_secs: u64,
    /// Custom LLM endpoint
    pub api_base_url: Option<String>,

    /// Total build runs, including the first
    pub max_build_attempts: u32,
    pub error_tail_lines: usize,
    pub gradle_tasks: Vec<String>,
    /// 0 disables the limit
    pub build_timeout_secs: u64,
    /// Gradle invocations inside one build attempt
    pub build_runs: u32,
    /// 0 relies on source control for history
    pub backup_generations: usize,
    pub log_level: String,

    pub github_username: Option<String>,
    pub github_token: Option<String>,
    pub github_repo_owner: Option<String>,
    pub github_repo_name: Option<String>,
    pub feature_branch: String,
    pub base_branch: String,
    pub github_api_url: String,
    pub github_server_url: String,
}

impl Default for MigrationConfig {
    /// Loads from the environment; an unknown provider name falls back to
    /// OpenAI (use [`parse_provider`] for strict parsing)
    fn default() -> Self {
        let provider = env_nonempty("POM2GRADLE_PROVIDER")
            .and_then(|p| parse_provider(&p).ok())
            .unwrap_or(AdapterKind::OpenAI);

        let model = env_nonempty("POM2GRADLE_MODEL")
            .unwrap_or_else(|| default_model(provider).to_string());

        let gradle_tasks = env_nonempty("POM2GRADLE_GRADLE_TASKS")
            .unwrap_or_else(|| DEFAULT_GRADLE_TASKS.to_string())
            .split_whitespace()
            .map(str::to_string)
            .collect();

        Self {
            provider,
            model,
            request_timeout_secs: env_parsed(
                "POM2GRADLE_REQUEST_TIMEOUT",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            api_base_url: env_nonempty("POM2GRADLE_API_BASE_URL"),
            max_build_attempts: env_parsed(
                "POM2GRADLE_MAX_BUILD_ATTEMPTS",
                DEFAULT_MAX_BUILD_ATTEMPTS,
            ),
            error_tail_lines: env_parsed("POM2GRADLE_ERROR_TAIL_LINES", DEFAULT_ERROR_TAIL_LINES),
            gradle_tasks,
            build_timeout_secs: env_parsed("POM2GRADLE_BUILD_TIMEOUT", DEFAULT_BUILD_TIMEOUT_SECS),
            build_runs: env_parsed("POM2GRADLE_BUILD_RUNS", DEFAULT_BUILD_RUNS),
            backup_generations: env_parsed("POM2GRADLE_BACKUP_GENERATIONS", 0),
            log_level: env_nonempty("POM2GRADLE_LOG_LEVEL")
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
                .to_lowercase(),
            github_username: env_nonempty("GITHUB_USERNAME"),
            github_token: env_nonempty("GITHUB_TOKEN"),
            github_repo_owner: env_nonempty("GITHUB_REPO_OWNER"),
            github_repo_name: env_nonempty("GITHUB_REPO_NAME"),
            feature_branch: env_nonempty("FEATURE_BRANCH_NAME")
                .unwrap_or_else(|| DEFAULT_FEATURE_BRANCH.to_string()),
            base_branch: env_nonempty("BASE_BRANCH_NAME")
                .unwrap_or_else(|| DEFAULT_BASE_BRANCH.to_string()),
            github_api_url: env_nonempty("GITHUB_API_URL")
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            github_server_url: env_nonempty("GITHUB_SERVER_URL")
                .unwrap_or_else(|| DEFAULT_GITHUB_SERVER_URL.to_string()),
        }
    }
}

impl MigrationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=600).contains(&self.request_timeout_secs) {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be between 1 second and 10 minutes".to_string(),
            ));
        }

        if !(1..=10).contains(&self.max_build_attempts) {
            return Err(ConfigError::ValidationFailed(
                "Max build attempts must be between 1 and 10".to_string(),
            ));
        }

        if !(1..=5).contains(&self.build_runs) {
            return Err(ConfigError::ValidationFailed(
                "Gradle runs per build attempt must be between 1 and 5".to_string(),
            ));
        }

        if self.error_tail_lines < 10 {
            return Err(ConfigError::ValidationFailed(
                "Error tail must keep at least 10 lines".to_string(),
            ));
        }

        if self.gradle_tasks.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "At least one Gradle task is required".to_string(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Model name must not be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        if self.feature_branch == self.base_branch {
            return Err(ConfigError::ValidationFailed(format!(
                "Feature branch must differ from base branch '{}'",
                self.base_branch
            )));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn build_timeout(&self) -> Option<Duration> {
        (self.build_timeout_secs > 0).then(|| Duration::from_secs(self.build_timeout_secs))
    }

    /// LLM client for the configured provider and model
    pub fn create_llm_client(&self) -> Result<Arc<dyn LLMClient>, ConfigError> {
        let client = GenAIClient::new(
            self.provider,
            self.model.clone(),
            self.request_timeout(),
            self.api_base_url.clone(),
        )?;
        Ok(Arc::new(client))
    }

    pub fn to_display_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert("provider".to_string(), self.provider.as_str().to_string());
        map.insert("model".to_string(), self.model.clone());
        map.insert(
            "request_timeout_secs".to_string(),
            self.request_timeout_secs.to_string(),
        );
        if let Some(ref url) = self.api_base_url {
            map.insert("api_base_url".to_string(), url.clone());
        }
        map.insert(
            "max_build_attempts".to_string(),
            self.max_build_attempts.to_string(),
        );
        map.insert(
            "error_tail_lines".to_string(),
            self.error_tail_lines.to_string(),
        );
        map.insert("gradle_tasks".to_string(), self.gradle_tasks.join(" "));
        map.insert(
            "build_timeout_secs".to_string(),
            self.build_timeout_secs.to_string(),
        );
        map.insert("build_runs".to_string(), self.build_runs.to_string());
        map.insert(
            "backup_generations".to_string(),
            self.backup_generations.to_string(),
        );
        map.insert("log_level".to_string(), self.log_level.clone());
        map.insert("feature_branch".to_string(), self.feature_branch.clone());
        map.insert("base_branch".to_string(), self.base_branch.clone());
        if let (Some(owner), Some(repo)) = (&self.github_repo_owner, &self.github_repo_name) {
            map.insert("repository".to_string(), format!("{}/{}", owner, repo));
        }
        map.insert(
            "github_token".to_string(),
            if self.github_token.is_some() { "<set>" } else { "<unset>" }.to_string(),
        );

        map
    }
}

impl fmt::Display for MigrationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "pom2gradle Configuration:")?;
        writeln!(f, "  Provider: {}", self.provider.as_str())?;
        writeln!(f, "  Model: {}", self.model)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Max Build Attempts: {}", self.max_build_attempts)?;
        writeln!(f, "  Gradle Tasks: {}", self.gradle_tasks.join(" "))?;
        match self.build_timeout() {
            Some(limit) => writeln!(f, "  Build Timeout: {}s", limit.as_secs())?,
            None => writeln!(f, "  Build Timeout: none")?,
        }
        writeln!(
            f,
            "  Branches: {} -> {}",
            self.feature_branch, self.base_branch
        )?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

/// Everything needed to clone, push and open a pull request
#[derive(Clone)]
pub struct GitHubSettings {
    pub username: String,
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub feature_branch: String,
    pub base_branch: String,
    pub api_url: String,
    pub server_url: String,
}

impl fmt::Debug for GitHubSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubSettings")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("feature_branch", &self.feature_branch)
            .field("base_branch", &self.base_branch)
            .field("api_url", &self.api_url)
            .field("server_url", &self.server_url)
            .finish()
    }
}

impl GitHubSettings {
    pub fn from_config(config: &MigrationConfig) -> Result<Self, ConfigError> {
        let require = |value: &Option<String>, name: &'static str| {
            value.clone().ok_or(ConfigError::MissingCredential(name))
        };

        Ok(Self {
            username: require(&config.github_username, "GITHUB_USERNAME")?,
            token: require(&config.github_token, "GITHUB_TOKEN")?,
            owner: require(&config.github_repo_owner, "GITHUB_REPO_OWNER")?,
            repo: require(&config.github_repo_name, "GITHUB_REPO_NAME")?,
            feature_branch: config.feature_branch.clone(),
            base_branch: config.base_branch.clone(),
            api_url: config.github_api_url.clone(),
            server_url: config.github_server_url.clone(),
        })
    }

    /// Commit identity for automated commits
    pub fn author_email(&self) -> String {
        format!("{}@users.noreply.github.com", self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const MANAGED_VARS: &[&str] = &[
        "POM2GRADLE_PROVIDER",
        "POM2GRADLE_MODEL",
        "POM2GRADLE_REQUEST_TIMEOUT",
        "POM2GRADLE_API_BASE_URL",
        "POM2GRADLE_MAX_BUILD_ATTEMPTS",
        "POM2GRADLE_ERROR_TAIL_LINES",
        "POM2GRADLE_GRADLE_TASKS",
        "POM2GRADLE_BUILD_TIMEOUT",
        "POM2GRADLE_BUILD_RUNS",
        "POM2GRADLE_BACKUP_GENERATIONS",
        "POM2GRADLE_LOG_LEVEL",
        "GITHUB_USERNAME",
        "GITHUB_TOKEN",
        "GITHUB_REPO_OWNER",
        "GITHUB_REPO_NAME",
        "FEATURE_BRANCH_NAME",
        "BASE_BRANCH_NAME",
        "GITHUB_API_URL",
        "GITHUB_SERVER_URL",
    ];

    /// Sets or clears an environment variable, restoring it on drop
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    fn clean_env() -> Vec<EnvGuard> {
        MANAGED_VARS.iter().map(|k| EnvGuard::unset(k)).collect()
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = clean_env();

        let config = MigrationConfig::default();

        assert_eq!(config.provider, AdapterKind::OpenAI);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.max_build_attempts, 3);
        assert_eq!(config.error_tail_lines, 300);
        assert_eq!(config.gradle_tasks, vec!["clean", "build", "test"]);
        assert_eq!(config.backup_generations, 0);
        assert_eq!(config.build_timeout(), Some(Duration::from_secs(1800)));
        assert_eq!(config.build_runs, 1);
        assert_eq!(config.feature_branch, "gradle-migration");
        assert_eq!(config.base_branch, "main");
        assert_eq!(config.github_api_url, "https://api.github.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let mut guards = clean_env();
        guards.extend([
            EnvGuard::set("POM2GRADLE_PROVIDER", "ollama"),
            EnvGuard::set("POM2GRADLE_REQUEST_TIMEOUT", "60"),
            EnvGuard::set("POM2GRADLE_MAX_BUILD_ATTEMPTS", "5"),
            EnvGuard::set("POM2GRADLE_GRADLE_TASKS", "build  check"),
            EnvGuard::set("POM2GRADLE_BACKUP_GENERATIONS", "2"),
            EnvGuard::set("POM2GRADLE_LOG_LEVEL", "DEBUG"),
            EnvGuard::set("FEATURE_BRANCH_NAME", "to-gradle"),
            EnvGuard::set("POM2GRADLE_BUILD_TIMEOUT", "0"),
            EnvGuard::set("POM2GRADLE_BUILD_RUNS", "2"),
        ]);

        let config = MigrationConfig::default();

        assert_eq!(config.provider, AdapterKind::Ollama);
        assert_eq!(config.model, "qwen2.5-coder:7b");
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.max_build_attempts, 5);
        assert_eq!(config.gradle_tasks, vec!["build", "check"]);
        assert_eq!(config.backup_generations, 2);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.feature_branch, "to-gradle");
        assert_eq!(config.build_timeout(), None);
        assert_eq!(config.build_runs, 2);
    }

    #[test]
    #[serial]
    fn test_invalid_numbers_fall_back_to_defaults() {
        let mut guards = clean_env();
        guards.push(EnvGuard::set("POM2GRADLE_MAX_BUILD_ATTEMPTS", "many"));

        assert_eq!(MigrationConfig::default().max_build_attempts, 3);
    }

    #[test]
    fn test_parse_provider() {
        assert_eq!(parse_provider("Claude").unwrap(), AdapterKind::Anthropic);
        assert_eq!(parse_provider("grok").unwrap(), AdapterKind::Xai);
        assert_eq!(parse_provider("groq").unwrap(), AdapterKind::Groq);
        assert!(matches!(
            parse_provider("watson"),
            Err(ConfigError::InvalidProvider(_))
        ));
    }

    #[test]
    #[serial]
    fn test_validation_failures() {
        let _guards = clean_env();
        let base = MigrationConfig::default();

        let mut config = base.clone();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.max_build_attempts = 11;
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.error_tail_lines = 5;
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.build_runs = 0;
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.gradle_tasks.clear();
        assert!(config.validate().is_err());

        let mut config = base;
        config.feature_branch = "main".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_github_settings_require_credentials() {
        let mut guards = clean_env();
        guards.extend([
            EnvGuard::set("GITHUB_USERNAME", "jane"),
            EnvGuard::set("GITHUB_TOKEN", "secret-token"),
            EnvGuard::set("GITHUB_REPO_OWNER", "acme"),
        ]);

        let config = MigrationConfig::default();
        assert!(matches!(
            GitHubSettings::from_config(&config),
            Err(ConfigError::MissingCredential("GITHUB_REPO_NAME"))
        ));

        guards.push(EnvGuard::set("GITHUB_REPO_NAME", "shop"));
        let settings = GitHubSettings::from_config(&MigrationConfig::default()).unwrap();
        assert_eq!(settings.owner, "acme");
        assert_eq!(settings.author_email(), "jane@users.noreply.github.com");
        assert!(!format!("{:?}", settings).contains("secret-token"));
    }

    #[test]
    #[serial]
    fn test_display_map_hides_token() {
        let mut guards = clean_env();
        guards.push(EnvGuard::set("GITHUB_TOKEN", "secret-token"));

        let config = MigrationConfig::default();
        let map = config.to_display_map();

        assert_eq!(map["github_token"], "<set>");
        assert!(map.values().all(|v| !v.contains("secret-token")));
        assert!(config.to_string().contains("Max Build Attempts: 3"));
    }
}
