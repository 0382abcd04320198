//! Application state shared across all handlers.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::cache::EngineCache;
use crate::config::Config;
use crate::engine::{EngineFactory, LanguageRegistry};
use crate::metrics::Metrics;
use crate::middleware::AccessPolicy;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap. The engine cache lives here,
/// created with the server and dropped with it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Language lookup and enumeration.
    registry: Arc<dyn LanguageRegistry>,

    /// Built engines, one per (language, mother tongue).
    engines: EngineCache,

    /// Who may call us.
    access: AccessPolicy,

    /// Prometheus metrics.
    metrics: Arc<Metrics>,

    /// Held for the whole request when requests are serialized. Shared so a
    /// guard can outlive the handler on a blocking task.
    serial: Option<Arc<Mutex<()>>>,

    /// Log the offending text of failed checks.
    verbose: bool,

    /// Cap on POST bodies.
    max_body_bytes: usize,
}

impl AppState {
    pub fn new(
        config: &Config,
        registry: Arc<dyn LanguageRegistry>,
        factory: Arc<dyn EngineFactory>,
    ) -> Self {
        let metrics = Arc::new(Metrics::new());
        let engines = EngineCache::new(factory, Arc::clone(&metrics));

        Self {
            inner: Arc::new(AppStateInner {
                registry,
                engines,
                access: AccessPolicy::new(config.trusted_addrs.clone()),
                metrics,
                serial: config.serialize_requests.then(|| Arc::new(Mutex::new(()))),
                verbose: config.verbose,
                max_body_bytes: config.max_body_bytes,
            }),
        }
    }

    pub fn registry(&self) -> &dyn LanguageRegistry {
        self.inner.registry.as_ref()
    }

    pub fn engines(&self) -> &EngineCache {
        &self.inner.engines
    }

    pub fn access(&self) -> &AccessPolicy {
        &self.inner.access
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.inner.metrics
    }

    pub fn verbose(&self) -> bool {
        self.inner.verbose
    }

    pub fn max_body_bytes(&self) -> usize {
        self.inner.max_body_bytes
    }

    /// Enter the global exclusive region, if requests are serialized.
    ///
    /// Returns `None` immediately in concurrent mode. The guard is owned, so
    /// work handed to another task can keep the region until it finishes.
    pub async fn exclusive(&self) -> Option<OwnedMutexGuard<()>> {
        match &self.inner.serial {
            Some(lock) => Some(Arc::clone(lock).lock_owned().await),
            None => None,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("engines", &self.inner.engines)
            .field("access", &self.inner.access)
            .field("serialized", &self.inner.serial.is_some())
            .finish()
    }
}
