//! Subcommand handlers; each returns the process exit code

use super::commands::{ConvertArgs, MigrateArgs, ModulesArgs};
use super::output::{OutputFormat, OutputFormatter};
use crate::build::GradleRunner;
use crate::config::{default_model, GitHubSettings, MigrationConfig};
use crate::gradle::{render_build_file, SourceScanLocator};
use crate::maven::{resolve_module_paths, POM_FILE};
use crate::pipeline::{MigrationOrchestrator, MigrationSettings, ProjectConversion, Workspace};
use crate::progress::LoggingHandler;
use crate::repair::LlmRepairAdvisor;
use crate::scm::{authenticated_url, GitCli, GitHubClient};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

fn project_root(path: &Option<PathBuf>) -> PathBuf {
    path.clone().unwrap_or_else(|| PathBuf::from("."))
}

pub fn handle_convert(args: &ConvertArgs) -> i32 {
    match run_convert(args) {
        Ok(output) => {
            print!("{}", output);
            0
        }
        Err(e) => {
            error!("Conversion failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn run_convert(args: &ConvertArgs) -> Result<String> {
    let root = project_root(&args.path);
    let conversion =
        ProjectConversion::plan(&root, args.main_class.as_deref(), &SourceScanLocator::new())?;

    if args.stdout {
        let translation = conversion
            .root_translation()
            .context("Root project was not translated")?;
        return Ok(render_build_file(&translation.model));
    }

    let written = conversion.write()?;
    OutputFormatter::new(OutputFormat::from(args.format)).format_conversion(&conversion, &written)
}

pub fn handle_modules(args: &ModulesArgs) -> i32 {
    let root_pom = project_root(&args.path).join(POM_FILE);
    let formatter = OutputFormatter::new(OutputFormat::from(args.format));

    let result = resolve_module_paths(&root_pom, args.absolute)
        .context("Failed to read modules")
        .and_then(|modules| formatter.format_modules(&modules));

    match result {
        Ok(output) => {
            print!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

pub async fn handle_migrate(args: &MigrateArgs, quiet: bool) -> i32 {
    let config = match load_config(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return 1;
        }
    };
    debug!(config = ?config.to_display_map(), "Configuration loaded");

    let (orchestrator, workspace) = match build_orchestrator(args, &config) {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return 1;
        }
    };

    let report = orchestrator.run(&workspace).await;
    info!("{}", report.summary());

    if !quiet || !report.succeeded() {
        match OutputFormatter::new(OutputFormat::from(args.format)).format_report(&report) {
            Ok(output) => print!("{}", output),
            Err(e) => eprintln!("Error: {:#}", e),
        }
    }

    if report.succeeded() {
        0
    } else {
        1
    }
}

/// Environment config with CLI overrides applied, validated
fn load_config(args: &MigrateArgs) -> Result<MigrationConfig> {
    let mut config = MigrationConfig::default();

    if let Some(provider) = args.backend {
        config.provider = provider;
        if args.model.is_none() && std::env::var("POM2GRADLE_MODEL").is_err() {
            config.model = default_model(provider).to_string();
        }
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(tasks) = &args.tasks {
        config.gradle_tasks = tasks.clone();
    }
    if let Some(attempts) = args.max_attempts {
        config.max_build_attempts = attempts;
    }
    if let Some(secs) = args.build_timeout {
        config.build_timeout_secs = secs;
    }

    config.validate()?;
    Ok(config)
}

fn build_orchestrator(
    args: &MigrateArgs,
    config: &MigrationConfig,
) -> Result<(MigrationOrchestrator, Workspace)> {
    let runner = GradleRunner::from_config(config);
    let advisor = LlmRepairAdvisor::new(config.create_llm_client()?);

    let settings = MigrationSettings::from(config).with_main_class(args.main_class.clone());
    let mut orchestrator = MigrationOrchestrator::new(Arc::new(runner), Arc::new(advisor))
        .with_settings(settings)
        .with_progress(Arc::new(LoggingHandler));

    let publish = !args.no_publish;
    let github = if publish || args.local.is_none() {
        Some(GitHubSettings::from_config(config)?)
    } else {
        None
    };

    let workspace = match &args.local {
        Some(dir) => {
            if let Some(github) = &github {
                let git = GitCli::new(None).with_author(&github.username, github.author_email());
                orchestrator = orchestrator.with_source_control(Arc::new(git));
            }
            Workspace::local(dir.clone())
        }
        None => {
            let github = github
                .as_ref()
                .context("Cloning needs GitHub settings")?;
            let url = authenticated_url(
                &github.server_url,
                &github.username,
                &github.token,
                &github.owner,
                &github.repo,
            )?;
            let git = GitCli::new(Some(url)).with_author(&github.username, github.author_email());
            orchestrator = orchestrator.with_source_control(Arc::new(git));

            let dir = args
                .workdir
                .clone()
                .unwrap_or_else(|| PathBuf::from(&github.repo));
            Workspace::remote(dir)
        }
    };

    if publish {
        if let Some(github) = &github {
            let host = GitHubClient::new(
                &github.api_url,
                &github.owner,
                &github.repo,
                &github.token,
                config.request_timeout(),
            )?;
            orchestrator = orchestrator.with_pull_request_host(Arc::new(host));
        }
    }

    Ok((orchestrator, workspace))
}
