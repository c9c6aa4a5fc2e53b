//! Output formatting for migration results
//!
//! Human-readable text for terminals and JSON for scripting.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::pipeline::{MigrationReport, MigrationState, ProjectConversion};
use crate::scm::PullRequestOutcome;

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// Human-readable formatted text
    Human,
}

#[derive(Serialize)]
struct ConversionSummary<'a> {
    written: &'a [String],
    skipped_modules: &'a [String],
    diagnostics: Vec<ModuleDiagnostics>,
}

#[derive(Serialize)]
struct ModuleDiagnostics {
    module: String,
    messages: Vec<String>,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_report(&self, report: &MigrationReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report)
                .context("Failed to serialize migration report to JSON"),
            OutputFormat::Human => Ok(self.format_report_human(report)),
        }
    }

    pub fn format_conversion(
        &self,
        conversion: &ProjectConversion,
        written: &[String],
    ) -> Result<String> {
        let diagnostics: Vec<ModuleDiagnostics> = conversion
            .converted
            .iter()
            .filter(|m| !m.translation.diagnostics.is_empty())
            .map(|m| ModuleDiagnostics {
                module: m.member.name.clone(),
                messages: m.translation.diagnostics.iter().map(|d| d.to_string()).collect(),
            })
            .collect();

        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&ConversionSummary {
                written,
                skipped_modules: &conversion.skipped,
                diagnostics,
            })
            .context("Failed to serialize conversion summary to JSON"),
            OutputFormat::Human => {
                let mut output = String::new();
                output.push_str("\u{2713} Gradle build generated\n");
                output.push_str(RULE);
                output.push_str("\n\n");
                for file in written {
                    output.push_str(&format!("  wrote {}\n", file));
                }
                for module in &conversion.skipped {
                    output.push_str(&format!("  \u{26A0} skipped {} (no pom.xml)\n", module));
                }
                for module in diagnostics {
                    output.push_str(&format!("\n{}:\n", module.module));
                    for message in module.messages {
                        output.push_str(&format!("  - {}\n", message));
                    }
                }
                Ok(output)
            }
        }
    }

    pub fn format_modules(&self, modules: &[PathBuf]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(modules).context("Failed to serialize modules to JSON")
            }
            OutputFormat::Human => {
                if modules.is_empty() {
                    return Ok("Single-module project (no <modules> declared)\n".to_string());
                }
                Ok(modules
                    .iter()
                    .map(|m| format!("{}\n", m.display()))
                    .collect())
            }
        }
    }

    fn format_report_human(&self, report: &MigrationReport) -> String {
        let mut output = String::new();

        match &report.state {
            MigrationState::Done => output.push_str("\u{2713} Migration complete\n"),
            _ => output.push_str("\u{2717} Migration failed\n"),
        }
        output.push_str(RULE);
        output.push_str("\n\n");

        output.push_str(&format!("Build attempts:  {}\n", report.build_attempts));
        output.push_str(&format!("Repairs applied: {}\n", report.repairs_applied));

        if !report.generated_files.is_empty() {
            output.push_str("Generated files:\n");
            for (i, file) in report.generated_files.iter().enumerate() {
                let connector = if i == report.generated_files.len() - 1 {
                    "\u{2514}"
                } else {
                    "\u{251C}"
                };
                output.push_str(&format!("{}\u{2500} {}\n", connector, file));
            }
        }

        if !report.skipped_modules.is_empty() {
            output.push_str(&format!(
                "\n\u{26A0} Skipped modules: {}\n",
                report.skipped_modules.join(", ")
            ));
        }

        match &report.pull_request {
            Some(PullRequestOutcome::Created(pr)) => {
                output.push_str(&format!("\nPull request #{} created: {}\n", pr.number, pr.html_url));
            }
            Some(PullRequestOutcome::Existing(pr)) => {
                output.push_str(&format!("\nPull request #{} already open: {}\n", pr.number, pr.html_url));
            }
            None => {}
        }

        if let MigrationState::Failed(reason) = &report.state {
            output.push_str(&format!("\nReason: {}\n", reason));
        }

        output
    }
}
