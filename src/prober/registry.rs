//! Prober registry and probe dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use prometheus::{Encoder, Registry, TextEncoder};

use super::ldap::LdapProber;
use super::metrics::{gauge, register};
use super::traits::{Deadline, ProbeError, Prober};
use crate::config::{Config, Module, ProberKind};

/// Outcome of one probe run.
pub struct ProbeReport {
    /// Whether the probe succeeded.
    pub success: bool,
    /// Wall time spent inside the prober.
    pub duration: Duration,
    /// Fresh registry holding this run's metrics only.
    pub registry: Registry,
}

impl std::fmt::Debug for ProbeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeReport")
            .field("success", &self.success)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

impl ProbeReport {
    /// Render the metrics in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buf) {
            tracing::error!(error = %e, "Failed to encode probe metrics");
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// Maps each [`ProberKind`] to the prober that handles it.
///
/// The default registry only knows LDAP; other protocols are plugged in
/// through [`ProberRegistry::register`].
pub struct ProberRegistry {
    probers: HashMap<ProberKind, Arc<dyn Prober>>,
}

impl Default for ProberRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(LdapProber));
        registry
    }
}

impl std::fmt::Debug for ProberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<String> = self.probers.keys().map(ToString::to_string).collect();
        kinds.sort_unstable();
        f.debug_struct("ProberRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

impl ProberRegistry {
    /// Registry with no probers.
    pub fn empty() -> Self {
        Self {
            probers: HashMap::new(),
        }
    }

    /// Register `prober` for its kind, returning the prober it replaced.
    pub fn register(&mut self, prober: Arc<dyn Prober>) -> Option<Arc<dyn Prober>> {
        self.probers.insert(prober.kind(), prober)
    }

    pub fn get(&self, kind: ProberKind) -> Option<&Arc<dyn Prober>> {
        self.probers.get(&kind)
    }

    /// Run one probe of `target` with `module`.
    ///
    /// The module timeout, when set, tightens `deadline`. Besides the
    /// prober's own metrics the report carries `probe_success` and
    /// `probe_duration_seconds`.
    ///
    /// # Errors
    /// Returns `ProbeError` when the module cannot be dispatched. A probe
    /// that runs and fails is reported through `ProbeReport::success`.
    pub async fn run(
        &self,
        target: &str,
        module: &Module,
        deadline: Deadline,
    ) -> Result<ProbeReport, ProbeError> {
        let kind = module.prober.ok_or(ProbeError::MissingProber)?;
        let prober = self
            .probers
            .get(&kind)
            .cloned()
            .ok_or(ProbeError::Unsupported(kind))?;
        let deadline = deadline.clamp(module.timeout);

        let registry = Registry::new();
        let success_gauge = gauge("", "success", "Displays whether or not the probe was a success")?;
        let duration_gauge = gauge(
            "",
            "duration_seconds",
            "Returns how long the probe took to complete in seconds",
        )?;
        register(&registry, &success_gauge);
        register(&registry, &duration_gauge);

        tracing::debug!(
            prober = %kind,
            target = %target,
            timeout_ms = deadline.remaining().as_millis() as u64,
            "Beginning probe"
        );

        let start = Instant::now();
        let success = prober.probe(target, module, deadline, &registry).await;
        let duration = start.elapsed();

        duration_gauge.set(duration.as_secs_f64());
        success_gauge.set(if success { 1.0 } else { 0.0 });

        if success {
            tracing::info!(
                prober = %kind,
                target = %target,
                duration_ms = duration.as_millis() as u64,
                "Probe succeeded"
            );
        } else {
            tracing::warn!(
                prober = %kind,
                target = %target,
                duration_ms = duration.as_millis() as u64,
                "Probe failed"
            );
        }

        Ok(ProbeReport {
            success,
            duration,
            registry,
        })
    }

    /// Look up `name` in `config` and run it against `target`.
    ///
    /// # Errors
    /// Returns `ProbeError::UnknownModule` if `config` has no such module,
    /// otherwise the errors of [`ProberRegistry::run`].
    pub async fn run_module(
        &self,
        config: &Config,
        name: &str,
        target: &str,
        deadline: Deadline,
    ) -> Result<ProbeReport, ProbeError> {
        let module = config
            .module(name)
            .ok_or_else(|| ProbeError::UnknownModule(name.to_string()))?;
        self.run(target, module, deadline).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProber {
        kind: ProberKind,
        result: bool,
        calls: AtomicUsize,
    }

    impl FixedProber {
        fn new(kind: ProberKind, result: bool) -> Self {
            Self {
                kind,
                result,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl Prober for FixedProber {
        fn kind(&self) -> ProberKind {
            self.kind
        }

        async fn probe(
            &self,
            _target: &str,
            _module: &Module,
            deadline: Deadline,
            _registry: &Registry,
        ) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(deadline.remaining() <= Duration::from_secs(2));
            self.result
        }
    }

    #[test]
    fn test_default_registers_ldap_only() {
        let registry = ProberRegistry::default();
        assert!(registry.get(ProberKind::Ldap).is_some());
        assert!(registry.get(ProberKind::Http).is_none());
        assert_eq!(format!("{registry:?}"), "ProberRegistry { kinds: [\"ldap\"] }");
    }

    #[tokio::test]
    async fn test_run_success_sets_probe_metrics() {
        let mut registry = ProberRegistry::empty();
        let prober = Arc::new(FixedProber::new(ProberKind::Tcp, true));
        registry.register(prober.clone());

        let module = Module::new(ProberKind::Tcp).with_timeout(Duration::from_secs(2));
        let report = registry
            .run("localhost:1", &module, Deadline::after(Duration::from_secs(30)))
            .await
            .unwrap();

        assert!(report.success);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 1);
        let text = report.render();
        assert!(text.contains("probe_success 1"));
        assert!(text.contains("probe_duration_seconds"));
    }

    #[tokio::test]
    async fn test_run_with_oversized_module_timeout() {
        let mut registry = ProberRegistry::empty();
        registry.register(Arc::new(FixedProber::new(ProberKind::Tcp, true)));

        let config = Config::from_yaml(
            "modules:\n  slow:\n    prober: tcp\n    timeout: 500000000000y\n",
        )
        .unwrap();
        let report = registry
            .run_module(&config, "slow", "localhost:1", Deadline::after(Duration::from_secs(2)))
            .await
            .unwrap();
        assert!(report.success);

        let module = Module::new(ProberKind::Tcp).with_timeout(Duration::MAX);
        let report = registry
            .run("localhost:1", &module, Deadline::after(Duration::from_secs(2)))
            .await
            .unwrap();
        assert!(report.success);
    }

    #[tokio::test]
    async fn test_run_failure_is_not_an_error() {
        let mut registry = ProberRegistry::empty();
        registry.register(Arc::new(FixedProber::new(ProberKind::Icmp, false)));

        let module = Module::new(ProberKind::Icmp);
        let report = registry
            .run("localhost", &module, Deadline::after(Duration::from_secs(1)))
            .await
            .unwrap();
        assert!(!report.success);
        assert!(report.render().contains("probe_success 0"));
    }

    #[tokio::test]
    async fn test_run_dispatch_errors() {
        let registry = ProberRegistry::empty();
        let deadline = Deadline::after(Duration::from_secs(1));

        let err = registry
            .run("x", &Module::new(ProberKind::Dns), deadline)
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Unsupported(ProberKind::Dns)));

        let err = registry
            .run("x", &Module::default(), deadline)
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::MissingProber));

        let err = registry
            .run_module(&Config::default(), "missing", "x", deadline)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown module \"missing\"");
    }

    #[test]
    fn test_register_replaces_same_kind() {
        let mut registry = ProberRegistry::empty();
        assert!(
            registry
                .register(Arc::new(FixedProber::new(ProberKind::Http, true)))
                .is_none()
        );
        assert!(
            registry
                .register(Arc::new(FixedProber::new(ProberKind::Http, false)))
                .is_some()
        );
    }
}
