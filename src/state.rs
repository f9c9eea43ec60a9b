//! Shared bridge state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. The
//! three collaborators sit behind trait objects so tests can swap in fakes
//! without a provider, backend or database.

use std::sync::Arc;

use crate::config::BridgeConfig;
use crate::identity::TokenVerifier;
use crate::net::api::ProfileDirectory;
use crate::services::session::SessionStore;

/// Clone is required by Axum; every field is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BridgeConfig>,
    pub sessions: Arc<dyn SessionStore>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub profiles: Arc<dyn ProfileDirectory>,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: BridgeConfig,
        sessions: Arc<dyn SessionStore>,
        verifier: Arc<dyn TokenVerifier>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self { config: Arc::new(config), sessions, verifier, profiles }
    }
}
