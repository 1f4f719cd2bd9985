//! User actions: analyze, compare, rewrite.
//!
//! Each action validates its inputs locally (no request on failure), calls the
//! gateway once, and on a backend failure asks the classification layer what
//! the caller should show.

use thiserror::Error;
use tracing::{info, warn};

use crate::api_client::types::{AnalysisResult, ComparisonResult, RewriteResult};
use crate::api_client::upload::{require_text, ResumeFile};
use crate::api_client::{AnalyzerApi, GatewayError};
use crate::classify::{resolve_failure, FailureResponse};
use crate::errors::AppError;
use crate::store::AppStore;

#[derive(Debug, Error)]
pub enum ActionError {
    /// Rejected before any request was made.
    #[error(transparent)]
    Invalid(AppError),

    /// The backend call failed; `response` says whether to prompt or notify.
    #[error("{error}")]
    Backend {
        error: GatewayError,
        response: FailureResponse,
    },
}

impl ActionError {
    fn backend(error: GatewayError) -> Self {
        let response = resolve_failure(&error);
        Self::Backend { error, response }
    }

    /// What to show the user. Validation failures are always plain notifications.
    pub fn response(&self) -> FailureResponse {
        match self {
            ActionError::Invalid(e) => FailureResponse::Notify(e.to_string()),
            ActionError::Backend { response, .. } => response.clone(),
        }
    }
}

impl From<ActionError> for AppError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Invalid(e) => e,
            ActionError::Backend { error, .. } => AppError::Gateway(error),
        }
    }
}

fn require_resume<'a>(
    resume: Option<&'a ResumeFile>,
    missing: &str,
) -> Result<&'a ResumeFile, ActionError> {
    let resume =
        resume.ok_or_else(|| ActionError::Invalid(AppError::Validation(missing.to_string())))?;
    resume.validate().map_err(ActionError::Invalid)?;
    Ok(resume)
}

/// Analyzes one resume. On success the result replaces the cached analysis.
pub async fn submit_analysis(
    api: &dyn AnalyzerApi,
    store: &AppStore,
    resume: Option<&ResumeFile>,
    job_description: &str,
) -> Result<AnalysisResult, ActionError> {
    let resume = require_resume(resume, "Please upload your resume")?;
    require_text(job_description, "a job description").map_err(ActionError::Invalid)?;

    let result = api
        .analyze(resume, job_description, None)
        .await
        .map_err(ActionError::backend)?;

    // The in-memory cache is updated even when the slot write fails.
    if let Err(e) = store.set_last_analysis(result.clone()) {
        warn!("Analysis cached in memory only: {e}");
    }
    info!(result_id = %result.result_id, score = result.score, "Analysis completed successfully");
    Ok(result)
}

/// Compares two resumes against one job description. Nothing is cached.
pub async fn submit_comparison(
    api: &dyn AnalyzerApi,
    resume_1: Option<&ResumeFile>,
    resume_2: Option<&ResumeFile>,
    job_description: &str,
) -> Result<ComparisonResult, ActionError> {
    let (Some(a), Some(b)) = (resume_1, resume_2) else {
        return Err(ActionError::Invalid(AppError::Validation(
            "Please upload both resumes".to_string(),
        )));
    };
    a.validate().map_err(ActionError::Invalid)?;
    b.validate().map_err(ActionError::Invalid)?;
    require_text(job_description, "a job description").map_err(ActionError::Invalid)?;

    let result = api
        .compare(a, b, job_description, None)
        .await
        .map_err(ActionError::backend)?;

    info!(better = result.better_resume.label(), "Comparison completed");
    Ok(result)
}

/// Requests a rewrite of one resume section. The job description may be empty.
pub async fn submit_rewrite(
    api: &dyn AnalyzerApi,
    section_text: &str,
    job_description: &str,
) -> Result<RewriteResult, ActionError> {
    require_text(section_text, "text to rewrite").map_err(ActionError::Invalid)?;

    let result = api
        .rewrite(section_text, job_description, None)
        .await
        .map_err(ActionError::backend)?;

    info!("Text rewritten successfully");
    Ok(result)
}
