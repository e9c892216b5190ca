//! Prometheus registry and exposition for the server.

use once_cell::sync::Lazy;
use prometheus::{Encoder, Registry, TextEncoder};

/// Global metrics registry, collecting the core job metrics.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

fn register_metrics(registry: &Registry) {
    let _ = registry.register(Box::new(scrub_core::metrics::JOBS_SUBMITTED.clone()));
    let _ = registry.register(Box::new(scrub_core::metrics::JOBS_COMPLETED.clone()));
    let _ = registry.register(Box::new(scrub_core::metrics::JOB_DURATION.clone()));
}

/// Renders the registry in Prometheus text exposition format.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
