//! Prometheus metrics collection.
//!
//! Provides dispatcher and engine-cache metrics in Prometheus format.

use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;

/// HTTP request labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    /// "languages", "check" or "denied".
    pub route: &'static str,
    pub status: u16,
}

/// Check labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct CheckLabels {
    /// "monolingual" or "bilingual".
    pub mode: &'static str,
}

/// Error labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ErrorLabels {
    pub kind: &'static str,
}

/// Application metrics.
pub struct Metrics {
    registry: Registry,

    /// Requests by route/status.
    pub http_requests: Family<RequestLabels, Counter>,

    /// Duration of completed checks.
    pub check_duration_seconds: Family<CheckLabels, Histogram>,

    /// Failed requests by error kind.
    pub errors: Family<ErrorLabels, Counter>,

    /// Engines built since start.
    pub engine_constructions: Counter,

    /// Engine lookups answered from the cache.
    pub engine_cache_hits: Counter,

    /// Engine lookups that had to build.
    pub engine_cache_misses: Counter,
}

impl Metrics {
    /// Create a new metrics registry.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let http_requests = Family::<RequestLabels, Counter>::default();
        registry.register(
            "http_requests",
            "Total HTTP requests",
            http_requests.clone(),
        );

        // Checks range from a few milliseconds to tens of seconds.
        let check_duration_seconds = Family::<CheckLabels, Histogram>::new_with_constructor(|| {
            Histogram::new(exponential_buckets(0.001, 2.0, 16))
        });
        registry.register(
            "check_duration_seconds",
            "Text check duration in seconds",
            check_duration_seconds.clone(),
        );

        let errors = Family::<ErrorLabels, Counter>::default();
        registry.register("request_errors", "Failed requests by kind", errors.clone());

        let engine_constructions = Counter::default();
        registry.register(
            "engine_constructions",
            "Engines constructed",
            engine_constructions.clone(),
        );

        let engine_cache_hits = Counter::default();
        registry.register(
            "engine_cache_hits",
            "Engine cache hit count",
            engine_cache_hits.clone(),
        );

        let engine_cache_misses = Counter::default();
        registry.register(
            "engine_cache_misses",
            "Engine cache miss count",
            engine_cache_misses.clone(),
        );

        Self {
            registry,
            http_requests,
            check_duration_seconds,
            errors,
            engine_constructions,
            engine_cache_hits,
            engine_cache_misses,
        }
    }

    /// Record an answered request.
    pub fn record_request(&self, route: &'static str, status: u16) {
        self.http_requests
            .get_or_create(&RequestLabels { route, status })
            .inc();
    }

    /// Record a completed check.
    pub fn record_check(&self, mode: &'static str, duration_secs: f64) {
        self.check_duration_seconds
            .get_or_create(&CheckLabels { mode })
            .observe(duration_secs);
    }

    /// Record a failed request.
    pub fn record_error(&self, kind: &'static str) {
        self.errors.get_or_create(&ErrorLabels { kind }).inc();
    }

    pub fn record_cache_hit(&self) {
        self.engine_cache_hits.inc();
    }

    pub fn record_cache_miss(&self) {
        self.engine_cache_misses.inc();
    }

    pub fn record_construction(&self) {
        self.engine_constructions.inc();
    }

    /// Encode metrics in Prometheus text format.
    ///
    /// # Panics
    ///
    /// Panics if Prometheus metric encoding to a `String` buffer fails.
    /// The `fmt::Write` impl for `String` is infallible, and all metric
    /// labels use derived `EncodeLabelSet` impls that do not produce
    /// `fmt::Error`.
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        // Prometheus encoding to String buffer is infallible
        #[allow(clippy::expect_used)]
        encode(&mut buffer, &self.registry).expect("encoding metrics");
        buffer
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish()
    }
}
