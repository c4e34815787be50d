use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::MetricsConfig;

/// Install the Prometheus recorder with its own HTTP listener.
/// Must be called from within the tokio runtime.
pub fn init(cfg: &MetricsConfig) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(cfg.listen)
        .install()
        .with_context(|| format!("installing prometheus exporter on {}", cfg.listen))?;

    crate::ingest::ensure_metrics_described();
    tracing::info!(listen = %cfg.listen, "prometheus exporter listening");
    Ok(())
}
