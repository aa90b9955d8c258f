//! Prometheus export and domain counters.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Call once at startup; later calls are no-ops.
pub fn init_metrics() -> Result<(), anyhow::Error> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    // Lost race: the other handle is already serving.
    let _ = METRICS_HANDLE.set(handle);
    Ok(())
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Count an engagement state change (`apply`, `approve`, `terminate`, `leave`).
pub fn record_transition(transition: &'static str) {
    metrics::counter!("engagement_transitions_total", "transition" => transition).increment(1);
}

/// Count an SMS delivery attempt by provider and outcome.
pub fn record_sms(provider: &'static str, status: &'static str) {
    metrics::counter!("sms_deliveries_total", "provider" => provider, "status" => status)
        .increment(1);
}

/// Count accounts created or removed.
pub fn record_account(kind: &'static str, event: &'static str) {
    metrics::counter!("accounts_total", "kind" => kind, "event" => event).increment(1);
}
