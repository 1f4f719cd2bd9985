use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::api_client::ApiClient;
use crate::config::Config;
use crate::store::slot::{FileSlot, KeyValueSlot, MemorySlot};
use crate::store::theme::TerminalTheme;
use crate::store::AppStore;

/// Everything a command handler needs, built once at startup.
pub struct AppContext {
    pub api: ApiClient,
    pub store: Arc<AppStore>,
    pub config: Config,
}

impl AppContext {
    /// Rehydrates the store and wires its credential into the gateway.
    ///
    /// With `persist` off nothing is read from or written to disk.
    pub fn build(config: Config, persist: bool) -> Result<Self> {
        let slot: Arc<dyn KeyValueSlot> = if persist {
            let file = FileSlot::new(config.state_file());
            debug!(path = %file.path().display(), "Using state file");
            Arc::new(file)
        } else {
            Arc::new(MemorySlot::default())
        };
        let store = Arc::new(AppStore::load(slot, &TerminalTheme));
        let api = ApiClient::new(
            &config.api_url,
            config.request_timeout,
            store.credential_provider(),
        )?;

        Ok(Self { api, store, config })
    }
}
