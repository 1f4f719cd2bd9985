//! Shared fixtures for unit tests: a mock backend and an in-memory fake gateway.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api_client::types::{
    AnalysisResult, BackendHealth, ComparisonResult, ProviderHealth, RewriteResult,
};
use crate::api_client::upload::ResumeFile;
use crate::api_client::{AnalyzerApi, GatewayError};

/// Serves `router` on an ephemeral localhost port and returns its base URL.
pub async fn spawn_backend(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn sample_result(result_id: &str) -> AnalysisResult {
    AnalysisResult {
        result_id: result_id.to_string(),
        score: 72,
        matched_keywords: vec!["Python".to_string()],
        missing_keywords: vec!["AWS".to_string()],
        suggestions: "Add cloud experience".to_string(),
    }
}

pub fn sample_resume() -> ResumeFile {
    ResumeFile::new("resume.pdf", b"%PDF-1.4 sample".to_vec())
}

/// Scripted gateway. Each operation pops its next canned reply; credentials seen are recorded.
#[derive(Default)]
pub struct FakeApi {
    pub analyze_replies: Mutex<VecDeque<Result<AnalysisResult, GatewayError>>>,
    pub result_replies: Mutex<VecDeque<Result<AnalysisResult, GatewayError>>>,
    pub compare_replies: Mutex<VecDeque<Result<ComparisonResult, GatewayError>>>,
    pub rewrite_replies: Mutex<VecDeque<Result<RewriteResult, GatewayError>>>,
    pub backend_replies: Mutex<VecDeque<Result<BackendHealth, GatewayError>>>,
    pub provider_replies: Mutex<VecDeque<Result<ProviderHealth, GatewayError>>>,
    pub credentials_seen: Mutex<Vec<Option<String>>>,
    calls: AtomicUsize,
}

impl FakeApi {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self, credential: Option<&str>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.credentials_seen
            .lock()
            .unwrap()
            .push(credential.map(str::to_owned));
    }
}

fn pop<T>(queue: &Mutex<VecDeque<Result<T, GatewayError>>>) -> Result<T, GatewayError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .expect("FakeApi called more times than scripted")
}

#[async_trait]
impl AnalyzerApi for FakeApi {
    async fn analyze(
        &self,
        _resume: &ResumeFile,
        _job_description: &str,
        credential: Option<&str>,
    ) -> Result<AnalysisResult, GatewayError> {
        self.record(credential);
        pop(&self.analyze_replies)
    }

    async fn get_result(&self, _result_id: &str) -> Result<AnalysisResult, GatewayError> {
        self.record(None);
        pop(&self.result_replies)
    }

    async fn compare(
        &self,
        _resume_1: &ResumeFile,
        _resume_2: &ResumeFile,
        _job_description: &str,
        credential: Option<&str>,
    ) -> Result<ComparisonResult, GatewayError> {
        self.record(credential);
        pop(&self.compare_replies)
    }

    async fn rewrite(
        &self,
        _section_text: &str,
        _job_description: &str,
        credential: Option<&str>,
    ) -> Result<RewriteResult, GatewayError> {
        self.record(credential);
        pop(&self.rewrite_replies)
    }

    async fn check_backend_health(&self) -> Result<BackendHealth, GatewayError> {
        self.record(None);
        pop(&self.backend_replies)
    }

    async fn check_provider_health(
        &self,
        credential: Option<&str>,
    ) -> Result<ProviderHealth, GatewayError> {
        self.record(credential);
        pop(&self.provider_replies)
    }
}
