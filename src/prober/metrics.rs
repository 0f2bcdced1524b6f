//! Metric helpers shared by every prober.

use std::time::Instant;

use prometheus::core::Collector;
use prometheus::{Gauge, GaugeVec, Opts, Registry};

/// Metric namespace for every probe metric.
pub const NAMESPACE: &str = "probe";

/// Label naming the phase of a duration sample.
pub const PHASE_LABEL: &str = "phase";

/// Build a gauge named `probe_<subsystem>_<name>` (or `probe_<name>` when
/// `subsystem` is empty).
pub fn gauge(subsystem: &str, name: &str, help: &str) -> prometheus::Result<Gauge> {
    Gauge::with_opts(
        Opts::new(name, help)
            .namespace(NAMESPACE)
            .subsystem(subsystem),
    )
}

/// Register `collector`, logging instead of failing when the registry
/// refuses it.
pub fn register<C>(registry: &Registry, collector: &C)
where
    C: Collector + Clone + 'static,
{
    if let Err(e) = registry.register(Box::new(collector.clone())) {
        tracing::error!(error = %e, "Failed to register probe metric");
    }
}

/// Duration gauge with one child per phase.
///
/// Children are created lazily, so phases that never run are absent from
/// the output instead of reporting zero.
#[derive(Debug, Clone)]
pub struct PhaseDurations {
    gauge: GaugeVec,
}

impl PhaseDurations {
    pub fn new(subsystem: &str) -> prometheus::Result<Self> {
        let gauge = GaugeVec::new(
            Opts::new("duration", "The duration it took for different phase of probing")
                .namespace(NAMESPACE)
                .subsystem(subsystem),
            &[PHASE_LABEL],
        )?;
        Ok(Self { gauge })
    }

    pub fn register(&self, registry: &Registry) {
        register(registry, &self.gauge);
    }

    /// Record the time elapsed since `start` for `phase`.
    pub fn record(&self, phase: &str, start: Instant) {
        let elapsed = start.elapsed().as_secs_f64();
        match self.gauge.get_metric_with_label_values(&[phase]) {
            Ok(child) => child.set(elapsed),
            Err(e) => {
                tracing::error!(phase, error = %e, "Error adding phase label to duration metric");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{Encoder, TextEncoder};

    fn render(registry: &Registry) -> String {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buf)
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_gauge_names() {
        let registry = Registry::new();
        let status = gauge("ldap", "status_code", "status").unwrap();
        let success = gauge("", "success", "success").unwrap();
        register(&registry, &status);
        register(&registry, &success);
        status.set(49.0);

        let text = render(&registry);
        assert!(text.contains("probe_ldap_status_code 49"));
        assert!(text.contains("probe_success 0"));
    }

    #[test]
    fn test_duplicate_registration_is_not_fatal() {
        let registry = Registry::new();
        let first = gauge("ldap", "result_count", "count").unwrap();
        let second = gauge("ldap", "result_count", "count").unwrap();
        register(&registry, &first);
        register(&registry, &second);
        first.set(3.0);
        assert!(render(&registry).contains("probe_ldap_result_count 3"));
    }

    #[test]
    fn test_phase_durations_only_lists_recorded_phases() {
        let registry = Registry::new();
        let phases = PhaseDurations::new("ldap").unwrap();
        phases.register(&registry);
        phases.record("connect", Instant::now());

        let text = render(&registry);
        assert!(text.contains("probe_ldap_duration{phase=\"connect\"}"));
        assert!(!text.contains("phase=\"bind\""));
    }
}
