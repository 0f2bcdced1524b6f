//! Module definitions: one named probe configuration per protocol.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use super::dns::DnsProbe;
use super::http::HttpProbe;
use super::icmp::IcmpProbe;
use super::ldap::LdapProbe;
use super::schema::{Schema, UnknownFields, strict_schema};
use super::tcp::TcpProbe;

/// Protocol a module exercises.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProberKind {
    Http,
    Tcp,
    Icmp,
    Dns,
    Ldap,
}

/// A named probe configuration.
///
/// Only the block matching [`Module::prober`] is consulted at probe time;
/// the others stay at their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Module {
    /// Protocol discriminator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prober: Option<ProberKind>,

    /// Upper bound for a single probe run (e.g. `5s`).
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,

    #[serde(default)]
    pub http: HttpProbe,

    #[serde(default)]
    pub tcp: TcpProbe,

    #[serde(default)]
    pub icmp: IcmpProbe,

    #[serde(default)]
    pub dns: DnsProbe,

    #[serde(default)]
    pub ldap: LdapProbe,

    #[serde(flatten)]
    pub unknown: UnknownFields,
}

impl Module {
    /// Create a module for the given protocol with default settings.
    pub fn new(prober: ProberKind) -> Self {
        Self {
            prober: Some(prober),
            ..Default::default()
        }
    }

    /// Set the probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the LDAP block.
    pub fn with_ldap(mut self, ldap: LdapProbe) -> Self {
        self.ldap = ldap;
        self
    }
}

impl Schema for Module {
    const CONTEXT: &'static str = "module";

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }
}

strict_schema!(Module);
