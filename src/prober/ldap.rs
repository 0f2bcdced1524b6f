//! LDAP prober.
//!
//! A probe connects to the target, performs a simple bind and, when the
//! module names a search base, runs a paged search. Each phase is timed
//! into `probe_ldap_duration{phase=...}`; the last LDAP result code lands
//! in `probe_ldap_status_code` and the number of returned entries in
//! `probe_ldap_result_count`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use ldap3::adapters::{Adapter, EntriesOnly, PagedResults};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, LdapResult};
use prometheus::{Gauge, Registry};
use tokio::task::JoinHandle;

use super::metrics::{PhaseDurations, gauge, register};
use super::traits::{Deadline, Prober};
use crate::config::{LdapProbe, LdapQuery, Module, ProberKind};

/// Metric subsystem for LDAP probes.
const SUBSYSTEM: &str = "ldap";

/// Entries requested per page of a search.
pub const PAGE_SIZE: i32 = 100;

/// Scheme assumed when the target has none.
const DEFAULT_SCHEME: &str = "ldap://";

/// Longest wait for the connection to close after unbind.
const RELEASE_GRACE: Duration = Duration::from_secs(1);

/// Phase names, in execution order.
pub const PHASE_CONNECT: &str = "connect";
pub const PHASE_BIND: &str = "bind";
pub const PHASE_SEARCH: &str = "search";

struct LdapMetrics {
    status_code: Gauge,
    result_count: Gauge,
    phases: PhaseDurations,
}

impl LdapMetrics {
    fn new() -> prometheus::Result<Self> {
        Ok(Self {
            status_code: gauge(SUBSYSTEM, "status_code", "Response status code")?,
            result_count: gauge(
                SUBSYSTEM,
                "result_count",
                "Number of entries returned by the search",
            )?,
            phases: PhaseDurations::new(SUBSYSTEM)?,
        })
    }

    fn register(&self, registry: &Registry) {
        register(registry, &self.status_code);
        register(registry, &self.result_count);
        self.phases.register(registry);
    }

    /// Record the LDAP result code carried by `err`, if any.
    fn record_error(&self, err: &LdapError) {
        if let Some(rc) = result_code(err) {
            self.status_code.set(f64::from(rc));
        }
    }
}

/// Build the connection URL for `target`.
pub fn ldap_url(target: &str) -> String {
    if target.contains("://") {
        target.to_string()
    } else {
        format!("{DEFAULT_SCHEME}{target}")
    }
}

/// LDAP result code carried by `err`; transport errors have none.
fn result_code(err: &LdapError) -> Option<u32> {
    match err {
        LdapError::LdapResult { result } => Some(result.rc),
        _ => None,
    }
}

/// Prober for LDAP directories.
#[derive(Debug, Default, Clone, Copy)]
pub struct LdapProber;

#[async_trait]
impl Prober for LdapProber {
    fn kind(&self) -> ProberKind {
        ProberKind::Ldap
    }

    async fn probe(
        &self,
        target: &str,
        module: &Module,
        deadline: Deadline,
        registry: &Registry,
    ) -> bool {
        let metrics = match LdapMetrics::new() {
            Ok(metrics) => metrics,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build LDAP metrics");
                return false;
            }
        };
        metrics.register(registry);

        let url = ldap_url(target);
        let settings = LdapConnSettings::new().set_conn_timeout(deadline.remaining());

        let start = Instant::now();
        let (conn, mut ldap) = match LdapConnAsync::with_settings(settings, &url).await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!(target = %target, error = %e, "Error dialing LDAP");
                return false;
            }
        };
        let driver = tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                tracing::debug!(error = %e, "LDAP connection closed with error");
            }
        });
        metrics.phases.record(PHASE_CONNECT, start);
        tracing::debug!(target = %target, "Connected to LDAP server");

        let success = bind_and_search(&mut ldap, &module.ldap, deadline, &metrics, target).await;

        release(ldap, driver, deadline).await;
        success
    }
}

async fn bind_and_search(
    ldap: &mut Ldap,
    config: &LdapProbe,
    deadline: Deadline,
    metrics: &LdapMetrics,
    target: &str,
) -> bool {
    let bind = &config.bind_simple;
    let start = Instant::now();
    let result = ldap
        .with_timeout(deadline.remaining())
        .simple_bind(&bind.username, bind.password.expose())
        .await
        .and_then(LdapResult::success);
    metrics.phases.record(PHASE_BIND, start);

    if let Err(e) = result {
        metrics.record_error(&e);
        tracing::error!(target = %target, username = %bind.username, error = %e, "Error during bind");
        return false;
    }
    metrics.status_code.set(0.0);
    tracing::debug!(target = %target, "Bind succeeded");

    let query = &config.query;
    if query.dn.is_empty() {
        return true;
    }

    let start = Instant::now();
    let result = tokio::time::timeout_at(deadline.instant(), search(ldap, query, deadline)).await;
    metrics.phases.record(PHASE_SEARCH, start);

    match result {
        Ok(Ok(count)) => {
            metrics.result_count.set(count as f64);
            tracing::debug!(target = %target, dn = %query.dn, entries = count, "Search succeeded");
            true
        }
        Ok(Err(e)) => {
            metrics.record_error(&e);
            tracing::error!(target = %target, dn = %query.dn, error = %e, "Error during search");
            false
        }
        Err(_) => {
            tracing::error!(target = %target, dn = %query.dn, "Search timed out");
            false
        }
    }
}

/// Paged search under `query.dn`, returning the number of entries.
async fn search(ldap: &mut Ldap, query: &LdapQuery, deadline: Deadline) -> Result<usize, LdapError> {
    let adapters: Vec<Box<dyn Adapter<_, _>>> = vec![
        Box::new(EntriesOnly::new()),
        Box::new(PagedResults::new(PAGE_SIZE)),
    ];
    let mut stream = ldap
        .with_timeout(deadline.remaining())
        .streaming_search_with(
            adapters,
            &query.dn,
            query.scope().into(),
            query.effective_filter(),
            query.attributes.clone(),
        )
        .await?;

    let mut count = 0;
    while stream.next().await?.is_some() {
        count += 1;
    }
    stream.finish().await.success()?;
    Ok(count)
}

/// Unbind and wait for the connection driver, aborting it if it outlives
/// the deadline.
async fn release(mut ldap: Ldap, mut driver: JoinHandle<()>, deadline: Deadline) {
    if let Err(e) = ldap.unbind().await {
        tracing::debug!(error = %e, "Error during unbind");
    }
    drop(ldap);
    let deadline = deadline.clamp(Some(RELEASE_GRACE));
    if tokio::time::timeout_at(deadline.instant(), &mut driver)
        .await
        .is_err()
    {
        driver.abort();
    }
}
