//! Persisted Application State: the client's single in-memory source of truth.
//!
//! `lastAnalysis`, `isDarkMode` and the credential survive restarts through one
//! durable slot; the provider health flag never does. Every mutation writes the
//! slot synchronously while the lock is held, so memory and disk agree on the
//! last completed write.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api_client::types::AnalysisResult;
use crate::api_client::CredentialProvider;

pub mod slot;
pub mod theme;

use slot::KeyValueSlot;
use theme::AmbientTheme;

/// Namespace key of the durable slot.
pub const STORAGE_KEY: &str = "ai-resume-analyzer-storage";
const STORAGE_VERSION: u32 = 0;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Last observed health of the upstream AI provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Error,
    Unknown,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Error => "error",
            HealthStatus::Unknown => "unknown",
        }
    }
}

/// Where the current dark-mode flag came from.
///
/// `Ambient` follows the host preference; the first explicit toggle switches to
/// `Manual` and there is no way back short of clearing the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeSource {
    Ambient,
    Manual,
}

#[derive(Debug, Clone, PartialEq)]
struct Inner {
    last_analysis: Option<AnalysisResult>,
    is_dark_mode: bool,
    theme_source: ThemeSource,
    credential: Option<String>,
    provider_health_status: Option<HealthStatus>,
}

impl Inner {
    fn defaults(ambient_dark: bool) -> Self {
        Self {
            last_analysis: None,
            is_dark_mode: ambient_dark,
            theme_source: ThemeSource::Ambient,
            credential: None,
            provider_health_status: None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Durable shape: {"state": {"lastAnalysis", "isDarkMode", "apiKey"}, "version"}
// ────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState<'a> {
    last_analysis: Option<&'a AnalysisResult>,
    /// Written only once the user has chosen explicitly.
    #[serde(skip_serializing_if = "Option::is_none")]
    is_dark_mode: Option<bool>,
    api_key: Option<&'a str>,
}

#[derive(Serialize)]
struct PersistedEnvelope<'a> {
    state: PersistedState<'a>,
    version: u32,
}

/// Reads each persisted field independently; anything unusable falls back to its default.
fn decode_slot(raw: Option<String>, ambient_dark: bool) -> Inner {
    let mut inner = Inner::defaults(ambient_dark);

    let Some(raw) = raw else {
        return inner;
    };
    let root: Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("Ignoring malformed persisted state: {e}");
            return inner;
        }
    };
    let Some(state) = root.get("state") else {
        return inner;
    };

    inner.last_analysis = state
        .get("lastAnalysis")
        .filter(|v| !v.is_null())
        .and_then(|v| match serde_json::from_value(v.clone()) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("Discarding unreadable cached analysis: {e}");
                None
            }
        });

    inner.credential = state
        .get("apiKey")
        .and_then(Value::as_str)
        .filter(|k| !k.is_empty())
        .map(str::to_owned);

    if let Some(dark) = state.get("isDarkMode").and_then(Value::as_bool) {
        inner.is_dark_mode = dark;
        inner.theme_source = ThemeSource::Manual;
    }

    inner
}

/// Process-wide state, constructed once and shared through `Arc`.
pub struct AppStore {
    inner: Mutex<Inner>,
    slot: Arc<dyn KeyValueSlot>,
}

impl AppStore {
    /// Rehydrates from the slot. Never fails: bad data degrades to defaults.
    pub fn load(slot: Arc<dyn KeyValueSlot>, ambient: &dyn AmbientTheme) -> Self {
        let inner = decode_slot(slot.get(STORAGE_KEY), ambient.prefers_dark());
        debug!(
            cached = inner.last_analysis.is_some(),
            has_credential = inner.credential.is_some(),
            theme = ?inner.theme_source,
            "State rehydrated"
        );
        Self {
            inner: Mutex::new(inner),
            slot,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, inner: &Inner) -> Result<(), StoreError> {
        let envelope = PersistedEnvelope {
            state: PersistedState {
                last_analysis: inner.last_analysis.as_ref(),
                is_dark_mode: match inner.theme_source {
                    ThemeSource::Manual => Some(inner.is_dark_mode),
                    ThemeSource::Ambient => None,
                },
                api_key: inner.credential.as_deref(),
            },
            version: STORAGE_VERSION,
        };
        let json = serde_json::to_string(&envelope)?;
        self.slot.set(STORAGE_KEY, &json)
    }

    /// Applies `mutate` in memory, then writes the slot. The in-memory change stands
    /// even if the write fails.
    fn update<T>(&self, mutate: impl FnOnce(&mut Inner) -> T) -> Result<T, StoreError> {
        let mut inner = self.lock();
        let out = mutate(&mut *inner);
        self.persist(&*inner).map_err(|e| {
            warn!("Failed to persist state: {e}");
            e
        })?;
        Ok(out)
    }

    // ── Reads ───────────────────────────────────────────────────────────────

    pub fn last_analysis(&self) -> Option<AnalysisResult> {
        self.lock().last_analysis.clone()
    }

    /// The cached analysis, if it is the one asked for.
    pub fn cached_result(&self, result_id: &str) -> Option<AnalysisResult> {
        self.lock()
            .last_analysis
            .as_ref()
            .filter(|r| r.result_id == result_id)
            .cloned()
    }

    pub fn is_dark_mode(&self) -> bool {
        self.lock().is_dark_mode
    }

    pub fn theme_source(&self) -> ThemeSource {
        self.lock().theme_source
    }

    pub fn credential(&self) -> Option<String> {
        self.lock().credential.clone()
    }

    pub fn provider_health_status(&self) -> Option<HealthStatus> {
        self.lock().provider_health_status
    }

    /// Accessor handed to the gateway. Holds only a weak reference to the store.
    pub fn credential_provider(self: &Arc<Self>) -> CredentialProvider {
        let store = Arc::downgrade(self);
        Arc::new(move || store.upgrade().and_then(|s| s.credential()))
    }

    // ── Writes ──────────────────────────────────────────────────────────────

    /// Replaces (never merges) the cached analysis.
    pub fn set_last_analysis(&self, analysis: AnalysisResult) -> Result<(), StoreError> {
        self.update(|inner| inner.last_analysis = Some(analysis))
    }

    pub fn clear_last_analysis(&self) -> Result<(), StoreError> {
        self.update(|inner| inner.last_analysis = None)
    }

    /// Flips the theme and pins it as an explicit choice. Returns the new value.
    pub fn toggle_dark_mode(&self) -> Result<bool, StoreError> {
        self.update(|inner| {
            inner.is_dark_mode = !inner.is_dark_mode;
            inner.theme_source = ThemeSource::Manual;
            inner.is_dark_mode
        })
    }

    /// `None` (or an empty string) clears the credential.
    pub fn set_credential(&self, credential: Option<String>) -> Result<(), StoreError> {
        let credential = credential.filter(|k| !k.is_empty());
        self.update(|inner| inner.credential = credential)
    }

    /// Session-only; never written to the slot.
    pub fn set_provider_health_status(&self, status: Option<HealthStatus>) {
        self.lock().provider_health_status = status;
    }

    /// Follows a host preference change while no explicit choice exists.
    /// Returns whether the flag changed.
    pub fn on_ambient_theme_change(&self, prefers_dark: bool) -> bool {
        let mut inner = self.lock();
        if inner.theme_source == ThemeSource::Manual || inner.is_dark_mode == prefers_dark {
            return false;
        }
        inner.is_dark_mode = prefers_dark;
        true
    }

    /// Deletes the durable slot and returns every persisted field to its default.
    pub fn clear_persisted(&self, ambient: &dyn AmbientTheme) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let health = inner.provider_health_status;
        *inner = Inner::defaults(ambient.prefers_dark());
        inner.provider_health_status = health;
        self.slot.remove(STORAGE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::slot::MemorySlot;
    use super::theme::FixedTheme;
    use super::*;
    use crate::test_support::sample_result;

    fn empty_store(ambient_dark: bool) -> (Arc<MemorySlot>, AppStore) {
        let slot = Arc::new(MemorySlot::default());
        let store = AppStore::load(slot.clone(), &FixedTheme(ambient_dark));
        (slot, store)
    }

    fn raw_slot(slot: &MemorySlot) -> Value {
        serde_json::from_str(&slot.get(STORAGE_KEY).unwrap()).unwrap()
    }

    #[test]
    fn test_round_trip_restores_persisted_fields_only() {
        let (slot, store) = empty_store(false);
        store.set_last_analysis(sample_result("A")).unwrap();
        assert!(store.toggle_dark_mode().unwrap());
        store.set_credential(Some("k".into())).unwrap();
        store.set_provider_health_status(Some(HealthStatus::Healthy));
        drop(store);

        let reloaded = AppStore::load(slot, &FixedTheme(false));

        assert_eq!(reloaded.last_analysis(), Some(sample_result("A")));
        assert!(reloaded.is_dark_mode());
        assert_eq!(reloaded.credential().as_deref(), Some("k"));
        assert_eq!(reloaded.provider_health_status(), None);
    }

    #[test]
    fn test_persisted_shape() {
        let (slot, store) = empty_store(false);
        store.toggle_dark_mode().unwrap();
        store.set_credential(Some("k".into())).unwrap();
        store.set_provider_health_status(Some(HealthStatus::Error));

        let raw = raw_slot(&slot);
        assert_eq!(raw["version"], 0);
        assert_eq!(raw["state"]["isDarkMode"], true);
        assert_eq!(raw["state"]["apiKey"], "k");
        assert!(raw["state"]["lastAnalysis"].is_null());
        assert!(raw["state"].get("openAIHealthStatus").is_none());
        assert!(raw["state"].get("providerHealthStatus").is_none());
    }

    #[test]
    fn test_corrupt_slot_degrades_to_defaults() {
        let slot = Arc::new(MemorySlot::with_entry(STORAGE_KEY, "{{{ not json"));
        let store = AppStore::load(slot, &FixedTheme(true));

        assert_eq!(store.last_analysis(), None);
        assert_eq!(store.credential(), None);
        assert!(store.is_dark_mode());
        assert_eq!(store.theme_source(), ThemeSource::Ambient);
    }

    #[test]
    fn test_partial_slot_falls_back_per_field() {
        let raw = r#"{"state":{"lastAnalysis":{"result_id":5},"apiKey":"k","isDarkMode":"yes"}}"#;
        let slot = Arc::new(MemorySlot::with_entry(STORAGE_KEY, raw));
        let store = AppStore::load(slot, &FixedTheme(true));

        assert_eq!(store.last_analysis(), None);
        assert_eq!(store.credential().as_deref(), Some("k"));
        assert!(store.is_dark_mode());
        assert_eq!(store.theme_source(), ThemeSource::Ambient);
    }

    #[test]
    fn test_theme_bootstrap_hands_off_to_manual() {
        let (slot, store) = empty_store(true);
        assert!(store.is_dark_mode());

        assert!(!store.toggle_dark_mode().unwrap());
        store.on_ambient_theme_change(false);
        assert!(!store.is_dark_mode());
        store.on_ambient_theme_change(true);
        assert!(!store.is_dark_mode());
        drop(store);

        let reloaded = AppStore::load(slot, &FixedTheme(true));
        assert!(!reloaded.is_dark_mode());
        assert_eq!(reloaded.theme_source(), ThemeSource::Manual);
    }

    #[test]
    fn test_ambient_mode_tracks_host_and_is_not_persisted() {
        let (slot, store) = empty_store(false);
        assert!(store.on_ambient_theme_change(true));
        assert!(store.is_dark_mode());

        store.set_credential(Some("k".into())).unwrap();
        assert!(raw_slot(&slot)["state"].get("isDarkMode").is_none());
        drop(store);

        let reloaded = AppStore::load(slot, &FixedTheme(false));
        assert!(!reloaded.is_dark_mode());
        assert_eq!(reloaded.theme_source(), ThemeSource::Ambient);
    }

    #[test]
    fn test_new_analysis_supersedes_cache() {
        let (_slot, store) = empty_store(false);
        store.set_last_analysis(sample_result("r1")).unwrap();
        store.set_last_analysis(sample_result("r2")).unwrap();

        assert_eq!(store.cached_result("r1"), None);
        assert_eq!(store.cached_result("r2"), Some(sample_result("r2")));

        store.clear_last_analysis().unwrap();
        assert_eq!(store.last_analysis(), None);
    }

    #[test]
    fn test_credential_provider_reads_latest_value() {
        let store = Arc::new(AppStore::load(
            Arc::new(MemorySlot::default()),
            &FixedTheme(false),
        ));
        let provider = store.credential_provider();
        assert_eq!(provider(), None);

        store.set_credential(Some("sk-1".into())).unwrap();
        assert_eq!(provider().as_deref(), Some("sk-1"));

        store.set_credential(Some(String::new())).unwrap();
        assert_eq!(provider(), None);
    }

    #[test]
    fn test_clear_persisted_returns_to_ambient() {
        let (slot, store) = empty_store(false);
        store.toggle_dark_mode().unwrap();
        store.set_credential(Some("k".into())).unwrap();

        store.clear_persisted(&FixedTheme(false)).unwrap();

        assert!(slot.get(STORAGE_KEY).is_none());
        assert_eq!(store.credential(), None);
        assert!(!store.is_dark_mode());
        assert_eq!(store.theme_source(), ThemeSource::Ambient);
    }
}
