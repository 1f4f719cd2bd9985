//! Error Classification: turns an opaque failure into an actionable category.
//!
//! Used reactively (after a failed user action) and proactively (after the
//! background provider-health probe). Nothing in here raises.
//!
//! TODO: drop the substring rules once the backend returns `error_type` on
//! every endpoint, not only `/health/openai`.

use serde::{Deserialize, Serialize};

use crate::api_client::types::{ProviderHealth, ProviderStatus};
use crate::api_client::GatewayError;

pub mod prompt;

pub const GENERIC_PROVIDER_ERROR: &str = "AI provider error";

const AUTHENTICATION_MARKERS: &[&str] = &["API key", "authentication"];
const RATE_LIMIT_MARKERS: &[&str] = &["quota", "rate limit"];

/// Category of a provider or backend failure. Wire names match the backend's `error_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AuthenticationError,
    RateLimitError,
    ApiError,
    UnknownError,
}

/// A failure tagged for UI branching. Lives only while one failure is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorClassification {
    pub kind: ErrorKind,
    /// Original message, kept verbatim for rate-limit errors.
    pub message: Option<String>,
}

impl ErrorClassification {
    pub fn authentication() -> Self {
        Self {
            kind: ErrorKind::AuthenticationError,
            message: None,
        }
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::RateLimitError,
            message: Some(message.into()),
        }
    }
}

/// What the caller should do about a failed user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureResponse {
    /// Show the credential prompt.
    PromptForCredential(ErrorClassification),
    /// Show a one-shot transient notification.
    Notify(String),
}

/// What the caller should do after the background provider probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeVerdict {
    Healthy,
    Prompt(ErrorClassification),
    Notify(String),
    /// Unclassified probe failure; logged, never shown.
    Silent(String),
}

/// Case-sensitive substring rules, first match wins.
pub fn classify_message(message: &str) -> Option<ErrorClassification> {
    if AUTHENTICATION_MARKERS.iter().any(|m| message.contains(m)) {
        return Some(ErrorClassification::authentication());
    }
    if RATE_LIMIT_MARKERS.iter().any(|m| message.contains(m)) {
        return Some(ErrorClassification::rate_limit(message));
    }
    None
}

/// Reactive path: a failed analyze/compare/rewrite call.
pub fn resolve_failure(err: &GatewayError) -> FailureResponse {
    match classify_message(&err.message) {
        Some(classification) => FailureResponse::PromptForCredential(classification),
        None => FailureResponse::Notify(err.message.clone()),
    }
}

/// Proactive path: the provider probe returned a structured body.
pub fn classify_provider_health(health: &ProviderHealth) -> ProbeVerdict {
    if health.status == ProviderStatus::Healthy {
        return ProbeVerdict::Healthy;
    }

    match health.error_type {
        Some(ErrorKind::AuthenticationError) => {
            ProbeVerdict::Prompt(ErrorClassification::authentication())
        }
        Some(ErrorKind::RateLimitError) => ProbeVerdict::Prompt(ErrorClassification::rate_limit(
            health.message.clone().unwrap_or_default(),
        )),
        _ => ProbeVerdict::Notify(
            health
                .message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| GENERIC_PROVIDER_ERROR.to_string()),
        ),
    }
}

/// Proactive path: the provider probe itself failed.
pub fn classify_probe_failure(err: &GatewayError) -> ProbeVerdict {
    match classify_message(&err.message) {
        Some(classification) => ProbeVerdict::Prompt(classification),
        None => ProbeVerdict::Silent(err.message.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::GatewayErrorKind;

    fn provider(status: ProviderStatus, message: Option<&str>, kind: Option<ErrorKind>) -> ProviderHealth {
        ProviderHealth {
            status,
            message: message.map(str::to_owned),
            model: None,
            error_type: kind,
            error_detail: None,
        }
    }

    #[test]
    fn test_invalid_api_key_is_authentication_error() {
        let c = classify_message("Invalid API key provided").unwrap();
        assert_eq!(c.kind, ErrorKind::AuthenticationError);
    }

    #[test]
    fn test_quota_is_rate_limit_and_keeps_message() {
        let c = classify_message("You exceeded your current quota").unwrap();
        assert_eq!(c.kind, ErrorKind::RateLimitError);
        assert_eq!(c.message.as_deref(), Some("You exceeded your current quota"));
    }

    #[test]
    fn test_internal_server_error_is_unclassified() {
        assert!(classify_message("Internal Server Error").is_none());
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert!(classify_message("invalid api key").is_none());
        assert!(classify_message("Rate Limit reached").is_none());
        assert!(classify_message("rate limit reached").is_some());
    }

    #[test]
    fn test_authentication_rule_wins_over_quota() {
        let c = classify_message("API key over quota").unwrap();
        assert_eq!(c.kind, ErrorKind::AuthenticationError);
    }

    #[test]
    fn test_resolve_failure_notifies_when_unclassified() {
        let err = GatewayError::new(GatewayErrorKind::Transport, "connection refused");
        assert_eq!(
            resolve_failure(&err),
            FailureResponse::Notify("connection refused".into())
        );
    }

    #[test]
    fn test_provider_health_structured_kinds() {
        assert_eq!(
            classify_provider_health(&provider(ProviderStatus::Healthy, None, None)),
            ProbeVerdict::Healthy
        );
        assert_eq!(
            classify_provider_health(&provider(
                ProviderStatus::Error,
                Some("quota exceeded"),
                Some(ErrorKind::RateLimitError)
            )),
            ProbeVerdict::Prompt(ErrorClassification::rate_limit("quota exceeded"))
        );
        assert_eq!(
            classify_provider_health(&provider(
                ProviderStatus::Error,
                Some("bad key"),
                Some(ErrorKind::AuthenticationError)
            )),
            ProbeVerdict::Prompt(ErrorClassification::authentication())
        );
    }

    #[test]
    fn test_provider_health_api_error_notifies() {
        assert_eq!(
            classify_provider_health(&provider(ProviderStatus::Error, None, Some(ErrorKind::ApiError))),
            ProbeVerdict::Notify(GENERIC_PROVIDER_ERROR.into())
        );
    }

    #[test]
    fn test_probe_failure_falls_back_to_substrings() {
        let quota = GatewayError::new(GatewayErrorKind::Http { status: 429 }, "rate limit hit");
        let other = GatewayError::new(GatewayErrorKind::Http { status: 503 }, "Service Unavailable");
        assert!(matches!(classify_probe_failure(&quota), ProbeVerdict::Prompt(_)));
        assert!(matches!(classify_probe_failure(&other), ProbeVerdict::Silent(_)));
    }
}
