//! Startup health probe: checks the backend, then the AI provider, after a short delay.

use std::time::Duration;

use tracing::{info, warn};

use crate::api_client::AnalyzerApi;
use crate::classify::{classify_probe_failure, classify_provider_health, ProbeVerdict};
use crate::store::{AppStore, HealthStatus};

/// What the probe found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The backend itself did not answer (or answered not-ok); nothing else was checked.
    BackendDown(String),
    Provider(ProbeVerdict),
}

/// Runs one probe after `delay`.
///
/// A backend failure is logged and never surfaced. The provider status is
/// recorded in the store: `Healthy` on success, `Error` on any other verdict.
pub async fn run_startup_probe(
    api: &dyn AnalyzerApi,
    store: &AppStore,
    delay: Duration,
) -> ProbeOutcome {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    match api.check_backend_health().await {
        Ok(health) if health.is_up() => {}
        Ok(health) => {
            warn!(status = %health.status, "Backend reported unhealthy");
            return ProbeOutcome::BackendDown(format!("Backend status: {}", health.status));
        }
        Err(e) => {
            warn!("Backend health check failed: {e}");
            return ProbeOutcome::BackendDown(e.message);
        }
    }

    let credential = store.credential();
    let verdict = match api.check_provider_health(credential.as_deref()).await {
        Ok(health) => classify_provider_health(&health),
        Err(e) => classify_probe_failure(&e),
    };

    if verdict == ProbeVerdict::Healthy {
        info!("AI provider healthy");
        store.set_provider_health_status(Some(HealthStatus::Healthy));
    } else {
        warn!(verdict = ?verdict, "AI provider unhealthy");
        store.set_provider_health_status(Some(HealthStatus::Error));
    }

    ProbeOutcome::Provider(verdict)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api_client::types::{BackendHealth, ProviderHealth, ProviderStatus};
    use crate::api_client::{GatewayError, GatewayErrorKind};
    use crate::classify::{ErrorClassification, ErrorKind};
    use crate::store::slot::MemorySlot;
    use crate::store::theme::FixedTheme;
    use crate::test_support::FakeApi;

    fn store() -> AppStore {
        AppStore::load(Arc::new(MemorySlot::default()), &FixedTheme(false))
    }

    fn up() -> Result<BackendHealth, GatewayError> {
        Ok(BackendHealth {
            status: "ok".into(),
        })
    }

    #[tokio::test]
    async fn test_backend_down_skips_provider_check() {
        let api = FakeApi::default();
        api.backend_replies.lock().unwrap().push_back(Err(GatewayError::new(
            GatewayErrorKind::Transport,
            "connection refused",
        )));
        let store = store();

        let outcome = run_startup_probe(&api, &store, Duration::ZERO).await;

        assert_eq!(outcome, ProbeOutcome::BackendDown("connection refused".into()));
        assert_eq!(api.calls(), 1);
        assert_eq!(store.provider_health_status(), None);
    }

    #[tokio::test]
    async fn test_healthy_provider_marks_store() {
        let api = FakeApi::default();
        api.backend_replies.lock().unwrap().push_back(up());
        api.provider_replies.lock().unwrap().push_back(Ok(ProviderHealth {
            status: ProviderStatus::Healthy,
            message: None,
            model: Some("gpt-4o-mini".into()),
            error_type: None,
            error_detail: None,
        }));
        let store = store();
        store.set_credential(Some("sk-1".into())).unwrap();

        let outcome = run_startup_probe(&api, &store, Duration::ZERO).await;

        assert_eq!(outcome, ProbeOutcome::Provider(ProbeVerdict::Healthy));
        assert_eq!(store.provider_health_status(), Some(HealthStatus::Healthy));
        let seen = api.credentials_seen.lock().unwrap().clone();
        assert_eq!(seen.last(), Some(&Some("sk-1".to_string())));
    }

    #[tokio::test]
    async fn test_rate_limited_provider_prompts() {
        let api = FakeApi::default();
        api.backend_replies.lock().unwrap().push_back(up());
        api.provider_replies.lock().unwrap().push_back(Ok(ProviderHealth {
            status: ProviderStatus::Error,
            message: Some("quota exceeded".into()),
            model: None,
            error_type: Some(ErrorKind::RateLimitError),
            error_detail: None,
        }));
        let store = store();

        let outcome = run_startup_probe(&api, &store, Duration::ZERO).await;

        assert_eq!(
            outcome,
            ProbeOutcome::Provider(ProbeVerdict::Prompt(ErrorClassification::rate_limit(
                "quota exceeded"
            )))
        );
        assert_eq!(store.provider_health_status(), Some(HealthStatus::Error));
    }

    #[tokio::test]
    async fn test_unclassified_probe_failure_is_silent() {
        let api = FakeApi::default();
        api.backend_replies.lock().unwrap().push_back(up());
        api.provider_replies.lock().unwrap().push_back(Err(GatewayError::new(
            GatewayErrorKind::Http { status: 500 },
            "Internal Server Error",
        )));
        let store = store();

        let outcome = run_startup_probe(&api, &store, Duration::ZERO).await;

        assert_eq!(
            outcome,
            ProbeOutcome::Provider(ProbeVerdict::Silent("Internal Server Error".into()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_waits_for_delay() {
        let api = Arc::new(FakeApi::default());
        api.backend_replies.lock().unwrap().push_back(up());
        api.provider_replies.lock().unwrap().push_back(Ok(ProviderHealth {
            status: ProviderStatus::Healthy,
            message: None,
            model: None,
            error_type: None,
            error_detail: None,
        }));
        let store = Arc::new(store());

        let task = {
            let api = api.clone();
            let store = store.clone();
            tokio::spawn(async move {
                run_startup_probe(api.as_ref(), &store, Duration::from_millis(1000)).await
            })
        };

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(api.calls(), 0);

        let outcome = task.await.unwrap();
        assert_eq!(outcome, ProbeOutcome::Provider(ProbeVerdict::Healthy));
        assert_eq!(api.calls(), 2);
    }
}
