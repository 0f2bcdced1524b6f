//! Configuration loading and validation.
//!
//! A configuration document maps module names to [`Module`] definitions:
//!
//! ```yaml
//! modules:
//!   ldap_search:
//!     prober: ldap
//!     timeout: 5s
//!     ldap:
//!       bind_simple:
//!         username: cn=monitor,dc=example,dc=org
//!         password: secret
//!       query:
//!         dn: ou=people,dc=example,dc=org
//!         filter: (objectClass=person)
//!         scope: sub
//!         attributes: [uid]
//! ```
//!
//! Every structured type decodes strictly: a key outside the schema fails the
//! whole document with `unknown fields in <context>: <names>`. Protocol rules
//! (DNS query name, LDAP DNs, filters and scopes) are checked as each block
//! decodes. A document either loads completely or not at all.

mod dn;
mod dns;
mod http;
mod icmp;
mod ldap;
mod module;
mod safe;
mod schema;
mod secret;
mod tcp;
mod tls;
mod validation;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use dn::{AttributeTypeAndValue, Dn, DnError, Rdn, parse_dn};
pub use dns::{DnsProbe, DnsRrValidator};
pub use http::{HttpClientConfig, HttpProbe};
pub use icmp::{DONT_FRAGMENT_SUPPORTED, IcmpProbe};
pub use ldap::{LdapBind, LdapProbe, LdapQuery, LdapScope, MATCH_ALL_FILTER};
pub use module::{Module, ProberKind};
pub use safe::SafeConfig;
pub use schema::{Schema, SchemaError, UnknownFields, check};
pub use secret::{REDACTED, Secret};
pub use tcp::{QueryResponse, TcpProbe};
pub use tls::{BasicAuth, TlsConfig};
pub use validation::{ConfigError, parse_duration};

use schema::strict_schema;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Config {
    /// Modules keyed by name.
    #[serde(default)]
    pub modules: BTreeMap<String, Module>,

    #[serde(flatten)]
    pub unknown: UnknownFields,
}

impl Schema for Config {
    const CONTEXT: &'static str = "config";

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }
}

strict_schema!(Config);

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Decode and validate a YAML document.
    ///
    /// # Errors
    /// Returns `ConfigError::ParseError` naming the first violated rule.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Render the configuration as YAML with every secret redacted.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(ConfigError::RenderError)
    }

    /// Look up a module by name.
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }
}
