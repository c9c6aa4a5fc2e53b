use super::{strip_code_fences, AdvisorError, RepairAdvisor, RepairRequest};
use crate::llm::{ChatMessage, LLMClient, LLMRequest};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const SYSTEM_PROMPT: &str = "You are a Gradle and Maven build assistant.";

const DEFAULT_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);
const TEMPERATURE: f32 = 0.2;

/// [`RepairAdvisor`] backed by an [`LLMClient`]. Transient backend failures
/// are retried with exponential backoff (`base`, `2 * base`, ...).
pub struct LlmRepairAdvisor {
    client: Arc<dyn LLMClient>,
    max_attempts: u32,
    backoff_base: Duration,
}

impl LlmRepairAdvisor {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self {
            client,
            max_attempts: DEFAULT_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    fn build_prompt(request: &RepairRequest) -> String {
        format!(
            "Given the following Maven pom.xml:\n\n\
             <pom.xml>\n{}\n</pom.xml>\n\n\
             And the current build.gradle:\n\n\
             <build.gradle>\n{}\n</build.gradle>\n\n\
             The following Gradle build error occurred:\n\n\
             <error>\n{}\n</error>\n\n\
             Return the corrected build.gradle content that resolves the error.\n\
             Only return the build.gradle file content, with no explanations or markdown formatting.",
            request.source_descriptor.trim(),
            request.current_build.trim(),
            request.error_excerpt.trim()
        )
    }
}

#[async_trait]
impl RepairAdvisor for LlmRepairAdvisor {
    async fn propose(&self, request: &RepairRequest) -> Result<String, AdvisorError> {
        let prompt = Self::build_prompt(request);
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            let llm_request = LLMRequest::new(vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(prompt.clone()),
            ])
            .with_temperature(TEMPERATURE);

            match self.client.chat(llm_request).await {
                Ok(response) => {
                    let proposal = strip_code_fences(&response.content);
                    if !proposal.is_empty() {
                        info!(
                            attempt,
                            backend = self.client.name(),
                            "Repair proposal received"
                        );
                        return Ok(proposal);
                    }
                    last_error = "empty proposal".to_string();
                    warn!(attempt, "Repair advisor returned an empty proposal");
                }
                Err(err) => {
                    warn!(attempt, error = %err, "Repair advisor request failed");
                    last_error = err.to_string();
                    if !err.is_transient() {
                        return Err(AdvisorError::Unavailable {
                            attempts: attempt,
                            last_error,
                        });
                    }
                }
            }

            if attempt < self.max_attempts {
                let delay = self.backoff_base * 2u32.saturating_pow(attempt - 1);
                tokio::time::sleep(delay).await;
            }
        }

        Err(AdvisorError::Unavailable {
            attempts: self.max_attempts,
            last_error,
        })
    }

    fn name(&self) -> &str {
        self.client.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{BackendError, MessageRole, MockLLMClient, MockResponse};

    fn request() -> RepairRequest {
        RepairRequest {
            source_descriptor: "<project/>".to_string(),
            current_build: "plugins { id 'java' }".to_string(),
            error_excerpt: "Could not resolve foo:bar".to_string(),
        }
    }

    fn advisor(mock: Arc<MockLLMClient>) -> LlmRepairAdvisor {
        LlmRepairAdvisor::new(mock).with_backoff(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_proposal_is_unfenced() {
        let mock = Arc::new(MockLLMClient::new());
        mock.add_response(MockResponse::text("```groovy\nplugins { id 'java-library' }\n```"));

        let proposal = advisor(mock.clone()).propose(&request()).await.unwrap();
        assert_eq!(proposal, "plugins { id 'java-library' }");

        let sent = &mock.requests()[0];
        assert_eq!(sent.temperature, Some(0.2));
        assert_eq!(sent.messages[0].role, MessageRole::System);
        assert_eq!(sent.messages[0].content, SYSTEM_PROMPT);
        let prompt = sent.last_user_message().unwrap();
        assert!(prompt.contains("<pom.xml>\n<project/>\n</pom.xml>"));
        assert!(prompt.contains("<build.gradle>\nplugins { id 'java' }\n</build.gradle>"));
        assert!(prompt.contains("<error>\nCould not resolve foo:bar\n</error>"));
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let mock = Arc::new(MockLLMClient::new());
        mock.add_responses(vec![
            MockResponse::error(BackendError::TimeoutError { seconds: 1 }),
            MockResponse::error(BackendError::NetworkError {
                message: "reset".to_string(),
            }),
            MockResponse::text("fixed"),
        ]);

        let proposal = advisor(mock.clone()).propose(&request()).await.unwrap();
        assert_eq!(proposal, "fixed");
        assert_eq!(mock.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_unavailable_after_attempts() {
        let mock = Arc::new(MockLLMClient::new());
        for _ in 0..3 {
            mock.add_response(MockResponse::error(BackendError::TimeoutError { seconds: 1 }));
        }

        let err = advisor(mock.clone()).propose(&request()).await.unwrap_err();
        let AdvisorError::Unavailable { attempts, .. } = err;
        assert_eq!(attempts, 3);
        assert_eq!(mock.remaining_responses(), 0);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let mock = Arc::new(MockLLMClient::new());
        mock.add_responses(vec![
            MockResponse::error(BackendError::AuthenticationError {
                message: "bad key".to_string(),
            }),
            MockResponse::text("never used"),
        ]);

        let err = advisor(mock.clone()).propose(&request()).await.unwrap_err();
        assert!(err.to_string().contains("bad key"));
        assert_eq!(mock.remaining_responses(), 1);
    }

    #[tokio::test]
    async fn test_empty_proposal_counts_as_failure() {
        let mock = Arc::new(MockLLMClient::new());
        mock.add_responses(vec![MockResponse::text("```\n```"), MockResponse::text("ok")]);

        let proposal = advisor(mock).propose(&request()).await.unwrap();
        assert_eq!(proposal, "ok");
    }
}
