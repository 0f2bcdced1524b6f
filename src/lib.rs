//! Sonde - Configuration-Driven Network Probing
//!
//! This crate provides the configuration model and protocol probers for the
//! Sonde probing engine. It can be used as a library by other Rust projects,
//! or run as a standalone binary with the `sonde` executable.
//!
//! # Architecture
//!
//! - **Config**: Strict YAML schema for probe modules, validated as it decodes
//! - **Probers**: One implementation per protocol behind the [`Prober`] trait
//! - **Metrics**: Every probe run publishes gauges into its own registry
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use sonde::{Deadline, ProberRegistry, SafeConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SafeConfig::default();
//! config.reload("sonde.yml")?;
//!
//! let report = ProberRegistry::default()
//!     .run_module(&config.current(), "ldap_bind", "localhost:389", Deadline::after(Duration::from_secs(5)))
//!     .await?;
//! assert!(report.success);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod prober;

pub use config::{Config, ConfigError, Module, ProberKind, SafeConfig, SchemaError, Secret};
pub use prober::{Deadline, ProbeError, ProbeReport, Prober, ProberRegistry};
