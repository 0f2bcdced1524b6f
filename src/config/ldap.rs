//! LDAP module configuration.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use super::dn::parse_dn;
use super::schema::{Schema, SchemaError, UnknownFields, strict_schema};
use super::secret::Secret;

/// Filter used when a query does not specify one.
pub const MATCH_ALL_FILTER: &str = "(objectClass=*)";

/// Search scope keyword accepted in `query.scope`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LdapScope {
    /// The base entry only.
    Base,
    /// Entries one level below the base.
    #[default]
    One,
    /// The base entry and its whole subtree.
    Sub,
}

impl From<LdapScope> for ldap3::Scope {
    fn from(scope: LdapScope) -> Self {
        match scope {
            LdapScope::Base => ldap3::Scope::Base,
            LdapScope::One => ldap3::Scope::OneLevel,
            LdapScope::Sub => ldap3::Scope::Subtree,
        }
    }
}

/// Simple bind credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct LdapBind {
    /// Bind DN. Empty means an anonymous bind.
    #[serde(default)]
    pub username: String,

    /// Bind password, redacted on serialization.
    #[serde(default)]
    pub password: Secret,

    #[serde(flatten)]
    pub unknown: UnknownFields,
}

impl Schema for LdapBind {
    const CONTEXT: &'static str = "ldap bind";

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }

    fn validate(&mut self) -> Result<(), SchemaError> {
        parse_dn(&self.username).map_err(|_| SchemaError::InvalidDn(self.username.clone()))?;
        Ok(())
    }
}

/// Search issued after a successful bind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct LdapQuery {
    /// Search base. Required whenever a `query` block is present.
    #[serde(default)]
    pub dn: String,

    /// Search filter. Empty matches every entry.
    #[serde(default)]
    pub filter: String,

    /// One of `base`, `one` or `sub`; normalized to `one` when empty.
    #[serde(default)]
    pub scope: String,

    /// Attributes to return. Empty requests all user attributes.
    #[serde(default)]
    pub attributes: Vec<String>,

    #[serde(flatten)]
    pub unknown: UnknownFields,
}

impl LdapQuery {
    /// Search scope, `one` when unset.
    pub fn scope(&self) -> LdapScope {
        self.scope.parse().unwrap_or_default()
    }

    /// Filter to send, falling back to [`MATCH_ALL_FILTER`].
    pub fn effective_filter(&self) -> &str {
        if self.filter.is_empty() {
            MATCH_ALL_FILTER
        } else {
            &self.filter
        }
    }
}

impl Schema for LdapQuery {
    const CONTEXT: &'static str = "ldap query";

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }

    fn validate(&mut self) -> Result<(), SchemaError> {
        if !self.filter.is_empty() && ldap3::parse_filter(&self.filter).is_err() {
            return Err(SchemaError::InvalidFilter(self.filter.clone()));
        }

        if self.dn.is_empty() {
            return Err(SchemaError::MissingDn);
        }

        parse_dn(&self.dn).map_err(|_| SchemaError::InvalidDn(self.dn.clone()))?;

        if self.scope.is_empty() {
            self.scope = LdapScope::One.to_string();
        } else if self.scope.parse::<LdapScope>().is_err() {
            return Err(SchemaError::UnknownScope(self.scope.clone()));
        }

        Ok(())
    }
}

/// LDAP prober settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct LdapProbe {
    #[serde(default)]
    pub bind_simple: LdapBind,

    /// Optional search; an empty `dn` limits the probe to connect and bind.
    #[serde(default)]
    pub query: LdapQuery,

    #[serde(flatten)]
    pub unknown: UnknownFields,
}

impl Schema for LdapProbe {
    const CONTEXT: &'static str = "ldap probe";

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }
}

strict_schema!(LdapBind, LdapQuery, LdapProbe);
