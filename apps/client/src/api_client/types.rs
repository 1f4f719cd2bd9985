//! Wire shapes returned by the analysis backend.

use serde::{Deserialize, Serialize};

use crate::classify::ErrorKind;

/// One completed single-resume analysis. Produced by `/analyze` and `/result/{id}`.
///
/// Never mutated after creation; a re-analysis yields a new `result_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub result_id: String,
    /// Compatibility percentage, conventionally 0–100 (not enforced here).
    pub score: i32,
    #[serde(default)]
    pub matched_keywords: Vec<String>,
    #[serde(default)]
    pub missing_keywords: Vec<String>,
    #[serde(default)]
    pub suggestions: String,
}

/// Which of the two compared resumes scored better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetterResume {
    #[serde(rename = "resume_1")]
    Resume1,
    #[serde(rename = "resume_2")]
    Resume2,
}

impl BetterResume {
    pub fn label(self) -> &'static str {
        match self {
            BetterResume::Resume1 => "Resume 1",
            BetterResume::Resume2 => "Resume 2",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub resume_1_score: i32,
    pub resume_2_score: i32,
    pub better_resume: BetterResume,
    #[serde(default)]
    pub analysis_summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteResult {
    pub improved_text: String,
    #[serde(default)]
    pub reasoning: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendHealth {
    pub status: String,
}

impl BackendHealth {
    /// The backend has reported both spellings over time.
    pub fn is_up(&self) -> bool {
        self.status == "ok" || self.status == "healthy"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Healthy,
    Error,
}

/// Body of `POST /health/openai`: reachability/validity of the upstream AI provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderHealth {
    pub status: ProviderStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub error_type: Option<ErrorKind>,
    #[serde(default)]
    pub error_detail: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Request bodies
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct RewriteRequest<'a> {
    pub section_text: &'a str,
    pub job_description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<&'a str>,
}

/// Error envelope the backend uses for non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}
