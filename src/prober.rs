//! Prober Layer
//!
//! Protocol probers share one contract: given a target, a [`Module`] and a
//! [`Deadline`], run the protocol's phases and publish metrics into a fresh
//! [`prometheus::Registry`], returning whether the probe succeeded.
//!
//! # Architecture
//!
//! - [`Prober`]: Core trait implemented per protocol
//! - [`ProberRegistry`]: Dispatches a module to the prober of its kind
//! - [`ProbeReport`]: Outcome plus the metrics of a single run
//! - [`ldap::LdapProber`]: Connect, simple bind and optional paged search
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use sonde::config::Config;
//! use sonde::prober::{Deadline, ProberRegistry};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load("sonde.yml")?;
//! let registry = ProberRegistry::default();
//! let report = registry
//!     .run_module(&config, "ldap_search", "ldap.example.org:389", Deadline::after(Duration::from_secs(10)))
//!     .await?;
//! println!("{}", report.render());
//! # Ok(())
//! # }
//! ```
//!
//! [`Module`]: crate::config::Module

pub mod ldap;
mod metrics;
mod registry;
mod traits;

pub use metrics::{NAMESPACE, PHASE_LABEL, PhaseDurations, gauge, register};
pub use registry::{ProbeReport, ProberRegistry};
pub use traits::{Deadline, ProbeError, Prober};
