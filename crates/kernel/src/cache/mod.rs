//! Engine cache keyed by (language, mother tongue).
//!
//! Engines are expensive to build (rule sets, dictionaries) and live as long
//! as the cache. Each key owns an initialization slot: building one key is
//! exclusive, unrelated keys build in parallel, and lookups of already built
//! engines only take the slot lock for as long as it takes to clone an `Arc`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::engine::{CheckEngine, EngineError, EngineFactory, Language};
use crate::metrics::Metrics;

/// Cache key. `None` is a key of its own, distinct from every mother tongue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EngineKey {
    pub language: Language,
    pub mother_tongue: Option<Language>,
}

impl EngineKey {
    pub fn new(language: &Language, mother_tongue: Option<&Language>) -> Self {
        Self {
            language: language.clone(),
            mother_tongue: mother_tongue.cloned(),
        }
    }
}

/// Initialization slot for one key; empty until the first successful build.
type Slot = Arc<Mutex<Option<Arc<dyn CheckEngine>>>>;

/// Memoizing engine store.
///
/// Entries are never evicted or reconfigured. A failed build leaves the slot
/// empty so the next request for that key tries again.
pub struct EngineCache {
    factory: Arc<dyn EngineFactory>,
    slots: DashMap<EngineKey, Slot>,
    built: AtomicUsize,
    metrics: Arc<Metrics>,
}

impl EngineCache {
    pub fn new(factory: Arc<dyn EngineFactory>, metrics: Arc<Metrics>) -> Self {
        Self {
            factory,
            slots: DashMap::new(),
            built: AtomicUsize::new(0),
            metrics,
        }
    }

    /// Return the engine for the key, building and activating it on first use.
    ///
    /// Blocks while another caller builds the same key; this is meant to run
    /// on a blocking thread.
    pub fn get_or_create(
        &self,
        language: &Language,
        mother_tongue: Option<&Language>,
    ) -> Result<Arc<dyn CheckEngine>, EngineError> {
        let slot = self.slot(EngineKey::new(language, mother_tongue));
        let mut engine = slot.lock();

        if let Some(existing) = engine.as_ref() {
            self.metrics.record_cache_hit();
            return Ok(Arc::clone(existing));
        }
        self.metrics.record_cache_miss();

        match mother_tongue {
            Some(mt) => info!(language = %language, mother_tongue = %mt, "creating engine"),
            None => info!(language = %language, "creating engine"),
        }

        let mut created = self.factory.create(language, mother_tongue)?;
        created.activate_default_pattern_rules()?;
        created.activate_default_false_friend_rules()?;

        let created: Arc<dyn CheckEngine> = Arc::from(created);
        *engine = Some(Arc::clone(&created));
        self.built.fetch_add(1, Ordering::Relaxed);
        self.metrics.record_construction();

        Ok(created)
    }

    /// Number of engines built so far.
    pub fn len(&self) -> usize {
        self.built.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an engine for the key has been built.
    pub fn contains(&self, language: &Language, mother_tongue: Option<&Language>) -> bool {
        let key = EngineKey::new(language, mother_tongue);
        let slot = self.slots.get(&key).map(|s| Arc::clone(s.value()));
        slot.is_some_and(|s| s.lock().is_some())
    }

    fn slot(&self, key: EngineKey) -> Slot {
        // Clone the Arc out so no map shard stays locked during a build.
        let existing = self.slots.get(&key).map(|s| Arc::clone(s.value()));
        match existing {
            Some(slot) => slot,
            None => {
                debug!(language = %key.language, "allocating engine slot");
                Arc::clone(self.slots.entry(key).or_default().value())
            }
        }
    }
}

impl std::fmt::Debug for EngineCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineCache")
            .field("engines", &self.len())
            .field("slots", &self.slots.len())
            .finish()
    }
}
