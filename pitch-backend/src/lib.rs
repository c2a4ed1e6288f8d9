pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
pub mod store;

use axum::extract::FromRef;
use config::AppConfig;
use services::TokenSigner;
use std::sync::Arc;
use store::StoreClientFactory;

/// Shared, read-only application state. Nothing in here is mutated after
/// startup, so handlers run concurrently without coordination.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: StoreClientFactory,
    /// `None` when LiveKit signing credentials are not configured.
    pub token_signer: Option<Arc<dyn TokenSigner>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: StoreClientFactory,
        token_signer: Option<Arc<dyn TokenSigner>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            token_signer,
        }
    }
}

impl FromRef<AppState> for StoreClientFactory {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}
