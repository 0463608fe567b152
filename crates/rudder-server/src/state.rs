//! Shared application state

use rudder_release::{ReleaseBackend, ReleaseLifecycleManager, ReleaseQueryService};
use rudder_repo::ResolveContext;
use std::sync::Arc;

use crate::config::Config;

/// State handed to every handler
///
/// Everything here is immutable; per-request settings are built fresh by
/// [`AppState::resolve_context`].
pub struct AppState<B> {
    pub config: Arc<Config>,
    pub manager: Arc<ReleaseLifecycleManager<B>>,
    pub query: Arc<ReleaseQueryService<B>>,
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            manager: Arc::clone(&self.manager),
            query: Arc::clone(&self.query),
        }
    }
}

impl<B: ReleaseBackend> AppState<B> {
    pub fn new(config: Config, backend: Arc<B>) -> Self {
        Self {
            config: Arc::new(config),
            manager: Arc::new(ReleaseLifecycleManager::new(Arc::clone(&backend))),
            query: Arc::new(ReleaseQueryService::new(backend)),
        }
    }

    /// Chart resolution settings for one request
    pub fn resolve_context(&self) -> ResolveContext {
        ResolveContext::new(self.config.home_dir(), self.config.download_path())
            .with_debug(self.config.debug)
    }

    /// Keyring to use when a request leaves it empty
    pub fn keyring(&self) -> String {
        self.config.keyring_path().to_string_lossy().into_owned()
    }
}
