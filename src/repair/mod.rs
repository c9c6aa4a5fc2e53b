//! Build-file repair
//!
//! A [`RepairAdvisor`] proposes a replacement build file from the original
//! POM, the current `build.gradle` and an error excerpt. Proposals are
//! untrusted text; the next build run is what validates them.

mod advisor;

pub use advisor::{LlmRepairAdvisor, SYSTEM_PROMPT};

use async_trait::async_trait;
use thiserror::Error;

/// Inputs for one repair proposal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairRequest {
    pub source_descriptor: String,
    pub current_build: String,
    pub error_excerpt: String,
}

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("Repair advisor unavailable after {attempts} attempt(s): {last_error}")]
    Unavailable { attempts: u32, last_error: String },
}

#[async_trait]
pub trait RepairAdvisor: Send + Sync {
    /// Proposed full replacement for the current build file
    async fn propose(&self, request: &RepairRequest) -> Result<String, AdvisorError>;

    fn name(&self) -> &str;
}

/// Removes a wrapping Markdown code fence (```` ``` ```` or ```` ```groovy ````)
/// and surrounding whitespace
pub fn strip_code_fences(content: &str) -> String {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let mut lines: Vec<&str> = trimmed.lines().collect();
    lines.remove(0);
    if lines.last().is_some_and(|l| l.trim_end().ends_with("```")) {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

/// Last `lines` lines of `log`
pub fn tail_lines(log: &str, lines: usize) -> String {
    let all: Vec<&str> = log.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(
            strip_code_fences("```groovy\nplugins { id 'java' }\n```"),
            "plugins { id 'java' }"
        );
        assert_eq!(strip_code_fences("```\nx\n```\n\n"), "x");
        assert_eq!(strip_code_fences("  plain text \n"), "plain text");
        assert_eq!(strip_code_fences("```\nunterminated"), "unterminated");
    }

    #[test]
    fn test_tail_lines() {
        let log = "a\nb\nc\nd";
        assert_eq!(tail_lines(log, 2), "c\nd");
        assert_eq!(tail_lines(log, 10), log);
        assert_eq!(tail_lines("", 3), "");
    }
}
