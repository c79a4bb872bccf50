use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Dispatch metrics
    pub dispatch_requests: IntCounterVec,
    pub dispatch_failures: IntCounterVec,
    pub dispatch_duration: HistogramVec,

    // Credential metrics
    pub credential_refreshes: IntCounterVec,
    pub credential_cache_hits: IntCounterVec,
    pub credential_expiry_unix: prometheus::IntGaugeVec,

    // Config/runtime
    pub config_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("dingtalk".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Dispatch
            dispatch_requests: IntCounterVec::new(Opts::new("dispatch_requests_total", "Dispatched RPC calls by dialect"), &["dialect"]).unwrap(),
            dispatch_failures: IntCounterVec::new(Opts::new("dispatch_failures_total", "Failed RPC calls by dialect and reason"), &["dialect", "reason"]).unwrap(),
            dispatch_duration: HistogramVec::new(HistogramOpts::new("dispatch_duration_seconds", "RPC round trip seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]), &["dialect"]).unwrap(),

            // Credentials
            credential_refreshes: IntCounterVec::new(Opts::new("credential_refreshes_total", "Network refreshes per credential"), &["credential"]).unwrap(),
            credential_cache_hits: IntCounterVec::new(Opts::new("credential_cache_hits_total", "Credential reads served from cache"), &["credential"]).unwrap(),
            credential_expiry_unix: prometheus::IntGaugeVec::new(Opts::new("credential_expiry_unix_seconds", "Expiry timestamp of the last refreshed credential"), &["credential"]).unwrap(),

            // Config/runtime
            config_errors: IntCounter::new("config_errors_total", "Parse and validation errors while loading config").unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.dispatch_requests.clone())).unwrap();
        reg.register(Box::new(metrics.dispatch_failures.clone())).unwrap();
        reg.register(Box::new(metrics.dispatch_duration.clone())).unwrap();
        reg.register(Box::new(metrics.credential_refreshes.clone())).unwrap();
        reg.register(Box::new(metrics.credential_cache_hits.clone())).unwrap();
        reg.register(Box::new(metrics.credential_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.config_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
