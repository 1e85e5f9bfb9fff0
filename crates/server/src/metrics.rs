//! Prometheus metrics for the pullcast server.
//!
//! Combines the server's own connection metrics with the pipeline
//! metrics exported by the core crate, all behind one registry.

use once_cell::sync::Lazy;
use prometheus::{self, Encoder, IntCounter, IntGauge, Registry, TextEncoder};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Progress connections currently open.
pub static PROGRESS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "pullcast_progress_connections_active",
        "Number of open progress streaming connections",
    )
    .unwrap()
});

/// Progress connections opened since startup.
pub static PROGRESS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "pullcast_progress_connections_total",
        "Total progress streaming connections since startup",
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(PROGRESS_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(PROGRESS_CONNECTIONS_TOTAL.clone()))
        .unwrap();

    // Pipeline metrics (jobs, durations, keepalives)
    for metric in pullcast_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
