//! Core prober trait and shared types.

use std::time::Duration;

use prometheus::Registry;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::{Module, ProberKind};

/// Errors raised while dispatching a probe.
///
/// A probe that runs and fails is not an error: it yields `false` plus
/// metrics. These variants cover requests that cannot be dispatched at all.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The requested module is not in the active configuration.
    #[error("unknown module \"{0}\"")]
    UnknownModule(String),

    /// The module does not declare a prober.
    #[error("module has no prober configured")]
    MissingProber,

    /// No prober is registered for the module's protocol.
    #[error("no prober registered for {0}")]
    Unsupported(ProberKind),

    /// Metric construction failed.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Horizon used when a timeout is too large to add to the current instant.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Point in time by which a whole probe must finish.
///
/// The deadline is the only cancellation signal. Probers hand
/// [`Deadline::remaining`] to their transport as its operation timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    /// Deadline `timeout` from now, saturating at a far-future instant.
    pub fn after(timeout: Duration) -> Self {
        let now = Instant::now();
        Self(now.checked_add(timeout).unwrap_or(now + FAR_FUTURE))
    }

    pub fn instant(self) -> Instant {
        self.0
    }

    /// Time left, zero once the deadline has passed.
    pub fn remaining(self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(self) -> bool {
        Instant::now() >= self.0
    }

    /// Tighten the deadline to at most `timeout` from now.
    #[must_use]
    pub fn clamp(self, timeout: Option<Duration>) -> Self {
        timeout
            .and_then(|timeout| Instant::now().checked_add(timeout))
            .map_or(self, |instant| self.min(Self(instant)))
    }
}

/// Protocol prober.
///
/// # Contract
///
/// 1. Register every metric into `registry` before setting any value.
///    Registration failures are logged and ignored.
/// 2. Run the protocol phases strictly in order, timing each one into a
///    duration gauge labelled by phase. A phase that never starts is never
///    recorded.
/// 3. Set the status gauge to 0 on success, or to the protocol's own code
///    when a failure carries one. Transport failures leave it untouched.
/// 4. Stop at the first failed phase and return `false`.
/// 5. Bound every blocking operation by `deadline` and release all network
///    resources before returning.
#[async_trait::async_trait]
pub trait Prober: Send + Sync + 'static {
    /// Protocol handled by this prober.
    fn kind(&self) -> ProberKind;

    /// Probe `target` using `module`, publishing metrics into `registry`.
    async fn probe(
        &self,
        target: &str,
        module: &Module,
        deadline: Deadline,
        registry: &Registry,
    ) -> bool;
}
