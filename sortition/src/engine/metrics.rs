use commonware_runtime::Metrics as RuntimeMetrics;
use prometheus_client::metrics::{counter::Counter, gauge::Gauge};

/// Metrics for the [Engine](super::Engine).
#[derive(Default)]
pub struct Metrics {
    /// Number of admitted groups
    pub groups: Gauge,
    /// Number of groups admitted
    pub submitted: Counter,
    /// Number of groups retired after expiring
    pub expired: Counter,
    /// Number of selections served
    pub selected: Counter,
    /// Number of rejected requests
    pub rejected: Counter,
}

impl Metrics {
    /// Create and return a new set of metrics, registered with the given context.
    pub fn init<E: RuntimeMetrics>(context: E) -> Self {
        let metrics = Self::default();
        context.register("groups", "Number of admitted groups", metrics.groups.clone());
        context.register(
            "submitted",
            "Number of groups admitted",
            metrics.submitted.clone(),
        );
        context.register(
            "expired",
            "Number of groups retired after expiring",
            metrics.expired.clone(),
        );
        context.register(
            "selected",
            "Number of selections served",
            metrics.selected.clone(),
        );
        context.register(
            "rejected",
            "Number of rejected requests",
            metrics.rejected.clone(),
        );
        metrics
    }
}
