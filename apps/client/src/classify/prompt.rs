//! Credential-entry prompt: shown after an authentication or quota failure.

use tracing::{info, warn};

use super::{ErrorClassification, ErrorKind};
use crate::api_client::types::ProviderStatus;
use crate::api_client::AnalyzerApi;
use crate::errors::AppError;
use crate::store::{AppStore, HealthStatus};

const INVALID_KEY_ALERT: &str = "Invalid API key. Please enter a valid OpenAI API key.";
const QUOTA_ALERT: &str =
    "API quota exceeded. Please check your OpenAI account or use a different API key.";
const DEFAULT_ALERT: &str = "Please enter your OpenAI API key to continue.";
const REJECTED_KEY: &str = "Invalid API key";

/// Result of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Credential stored, health marked healthy, prompt closed.
    Accepted,
    /// Prompt stays open with this message shown.
    Rejected(String),
}

/// State of the credential prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialPrompt {
    open: bool,
    classification: Option<ErrorClassification>,
    /// Message from the last failed submission.
    last_error: Option<String>,
}

impl CredentialPrompt {
    pub fn open_for(classification: Option<ErrorClassification>) -> Self {
        Self {
            open: true,
            classification,
            last_error: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn title(&self) -> &'static str {
        "OpenAI API Key Required"
    }

    pub fn description(&self) -> &'static str {
        match self.kind() {
            Some(ErrorKind::RateLimitError) => {
                "The backend API quota has been exceeded. Please provide your own OpenAI API key to continue using the service."
            }
            _ => {
                "Enter your OpenAI API key to analyze resumes. Your key is stored locally and only sent to the backend for processing."
            }
        }
    }

    /// The alert line, present only when the prompt was opened because of a failure.
    pub fn alert(&self) -> Option<String> {
        let classification = self.classification.as_ref()?;
        let text = match classification.kind {
            ErrorKind::AuthenticationError => INVALID_KEY_ALERT.to_string(),
            ErrorKind::RateLimitError => QUOTA_ALERT.to_string(),
            _ => classification
                .message
                .clone()
                .unwrap_or_else(|| DEFAULT_ALERT.to_string()),
        };
        Some(text)
    }

    /// The backend's own wording, shown for quota failures so the user knows why.
    pub fn backend_message(&self) -> Option<&str> {
        self.classification
            .as_ref()
            .filter(|c| c.kind == ErrorKind::RateLimitError)
            .and_then(|c| c.message.as_deref())
    }

    fn kind(&self) -> Option<ErrorKind> {
        self.classification.as_ref().map(|c| c.kind)
    }

    /// Closes without resolving; the failed action can be retried.
    pub fn dismiss(&mut self) {
        self.open = false;
    }

    /// Validates `candidate` against the provider and stores it on success.
    ///
    /// Blank input is rejected before any request is made.
    pub async fn submit(
        &mut self,
        candidate: &str,
        api: &dyn AnalyzerApi,
        store: &AppStore,
    ) -> Result<SubmitOutcome, AppError> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return Err(AppError::Validation("Please enter an API key".to_string()));
        }

        let message = match api.check_provider_health(Some(candidate)).await {
            Ok(health) if health.status == ProviderStatus::Healthy => {
                store.set_credential(Some(candidate.to_string()))?;
                store.set_provider_health_status(Some(HealthStatus::Healthy));
                self.open = false;
                self.last_error = None;
                info!("API key validated and stored");
                return Ok(SubmitOutcome::Accepted);
            }
            Ok(health) => health
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| REJECTED_KEY.to_string()),
            Err(e) => e.message,
        };

        warn!("API key rejected: {message}");
        store.set_provider_health_status(Some(HealthStatus::Error));
        self.last_error = Some(message.clone());
        Ok(SubmitOutcome::Rejected(message))
    }
}
