/// API Client: the single point of entry for every call to the analysis backend.
///
/// ARCHITECTURAL RULE: No other module may talk to the backend directly.
/// All HTTP interactions MUST go through this module.
///
/// Every failure (transport, HTTP status, payload shape) leaves this module as a
/// `GatewayError` carrying one human-readable message.
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{multipart::Form, Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

pub mod types;
pub mod upload;

use types::{
    AnalysisResult, BackendHealth, ComparisonResult, ErrorBody, ProviderHealth, RewriteRequest,
    RewriteResult,
};
use upload::ResumeFile;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Reads the user's credential at call time. The gateway never owns it.
pub type CredentialProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// A provider that never supplies a credential.
#[cfg(test)]
pub fn no_credentials() -> CredentialProvider {
    Arc::new(|| None)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// No response was received (connect failure, timeout, broken body).
    Transport,
    /// The backend answered with a non-2xx status.
    Http { status: u16 },
    /// The backend answered 2xx but the body was not the expected shape.
    Payload,
}

/// The normalized failure of any backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub message: String,
}

impl GatewayError {
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, GatewayErrorKind::Http { status: 404 })
    }

    fn transport(err: reqwest::Error, timeout: Duration) -> Self {
        let message = if err.is_timeout() {
            format!("Request timed out after {timeout:?}")
        } else {
            err.to_string()
        };
        Self::new(GatewayErrorKind::Transport, message)
    }

    /// Extracts `detail`, then `message`, from an error body; falls back to the status.
    fn from_error_body(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorBody>(body).unwrap_or_default();

        let detail = parsed.detail.and_then(|d| match d {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });

        let message = detail
            .or(parsed.message.filter(|m| !m.is_empty()))
            .unwrap_or_else(|| format!("Request failed with status code {status}"));

        Self::new(GatewayErrorKind::Http { status }, message)
    }
}

/// The backend operations the rest of the client depends on.
///
/// `ApiClient` is the production implementation; flows take `&dyn AnalyzerApi`
/// so they can be exercised against an in-memory fake.
#[async_trait]
pub trait AnalyzerApi: Send + Sync {
    async fn analyze(
        &self,
        resume: &ResumeFile,
        job_description: &str,
        credential: Option<&str>,
    ) -> Result<AnalysisResult, GatewayError>;

    async fn get_result(&self, result_id: &str) -> Result<AnalysisResult, GatewayError>;

    async fn compare(
        &self,
        resume_1: &ResumeFile,
        resume_2: &ResumeFile,
        job_description: &str,
        credential: Option<&str>,
    ) -> Result<ComparisonResult, GatewayError>;

    async fn rewrite(
        &self,
        section_text: &str,
        job_description: &str,
        credential: Option<&str>,
    ) -> Result<RewriteResult, GatewayError>;

    async fn check_backend_health(&self) -> Result<BackendHealth, GatewayError>;

    async fn check_provider_health(
        &self,
        credential: Option<&str>,
    ) -> Result<ProviderHealth, GatewayError>;
}

/// HTTP gateway to the analysis backend.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
    credentials: CredentialProvider,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        credentials: CredentialProvider,
    ) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid backend URL '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Backend URL '{base_url}' cannot carry a path");
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            timeout,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// An explicit non-empty credential wins; otherwise the provider is asked.
    fn resolve_credential(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .filter(|k| !k.is_empty())
            .map(str::to_owned)
            .or_else(|| (self.credentials)())
            .filter(|k| !k.is_empty())
    }

    fn with_credential(&self, form: Form, explicit: Option<&str>) -> Form {
        match self.resolve_credential(explicit) {
            Some(key) => form.text("api_key", key),
            None => form,
        }
    }

    fn file_part(
        &self,
        resume: &ResumeFile,
    ) -> Result<reqwest::multipart::Part, GatewayError> {
        resume
            .to_part()
            .map_err(|e| GatewayError::transport(e, self.timeout))
    }

    /// Sends a request and decodes a 2xx JSON body, normalizing every failure.
    async fn send<T: DeserializeOwned>(
        &self,
        route: &str,
        request: RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::transport(e, self.timeout))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = GatewayError::from_error_body(status.as_u16(), &body);
            warn!(route, status = status.as_u16(), "Backend call failed: {}", err.message);
            return Err(err);
        }

        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::transport(e, self.timeout))?;

        serde_json::from_str(&body).map_err(|e| {
            warn!(route, "Unexpected response shape: {e}");
            GatewayError::new(
                GatewayErrorKind::Payload,
                format!("Unexpected response from {route}: {e}"),
            )
        })
    }
}

#[async_trait]
impl AnalyzerApi for ApiClient {
    async fn analyze(
        &self,
        resume: &ResumeFile,
        job_description: &str,
        credential: Option<&str>,
    ) -> Result<AnalysisResult, GatewayError> {
        let form = Form::new()
            .part("resume", self.file_part(resume)?)
            .text("job_description", job_description.to_string());
        let form = self.with_credential(form, credential);

        let result: AnalysisResult = self
            .send("/analyze", self.client.post(self.endpoint(&["analyze"])).multipart(form))
            .await?;

        debug!(result_id = %result.result_id, score = result.score, "Analysis completed");
        Ok(result)
    }

    async fn get_result(&self, result_id: &str) -> Result<AnalysisResult, GatewayError> {
        self.send(
            "/result",
            self.client.get(self.endpoint(&["result", result_id])),
        )
        .await
    }

    async fn compare(
        &self,
        resume_1: &ResumeFile,
        resume_2: &ResumeFile,
        job_description: &str,
        credential: Option<&str>,
    ) -> Result<ComparisonResult, GatewayError> {
        let form = Form::new()
            .part("resume_1", self.file_part(resume_1)?)
            .part("resume_2", self.file_part(resume_2)?)
            .text("job_description", job_description.to_string());
        let form = self.with_credential(form, credential);

        self.send("/compare", self.client.post(self.endpoint(&["compare"])).multipart(form))
            .await
    }

    async fn rewrite(
        &self,
        section_text: &str,
        job_description: &str,
        credential: Option<&str>,
    ) -> Result<RewriteResult, GatewayError> {
        let key = self.resolve_credential(credential);
        let body = RewriteRequest {
            section_text,
            job_description,
            api_key: key.as_deref(),
        };

        self.send("/rewrite", self.client.post(self.endpoint(&["rewrite"])).json(&body))
            .await
    }

    async fn check_backend_health(&self) -> Result<BackendHealth, GatewayError> {
        self.send("/health", self.client.get(self.endpoint(&["health"])))
            .await
    }

    async fn check_provider_health(
        &self,
        credential: Option<&str>,
    ) -> Result<ProviderHealth, GatewayError> {
        let mut fields: Vec<(&str, String)> = Vec::new();
        if let Some(key) = self.resolve_credential(credential) {
            fields.push(("api_key", key));
        }

        self.send(
            "/health/openai",
            self.client
                .post(self.endpoint(&["health", "openai"]))
                .form(&fields),
        )
        .await
    }
}
