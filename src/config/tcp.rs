//! TCP module configuration.

use serde::{Deserialize, Serialize};

use super::schema::{Schema, SchemaError, UnknownFields, check_patterns, strict_schema};
use super::tls::TlsConfig;

/// One step of a scripted TCP exchange.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct QueryResponse {
    /// Regular expression the next line read must match.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub expect: String,

    /// Line written to the connection.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub send: String,

    /// Upgrade the connection to TLS at this step.
    #[serde(default)]
    pub starttls: bool,

    #[serde(flatten)]
    pub unknown: UnknownFields,
}

impl Schema for QueryResponse {
    const CONTEXT: &'static str = "query response";

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }

    fn validate(&mut self) -> Result<(), SchemaError> {
        if self.expect.is_empty() {
            return Ok(());
        }
        check_patterns(Self::CONTEXT, std::slice::from_ref(&self.expect))
    }
}

/// TCP prober settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct TcpProbe {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub preferred_ip_protocol: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_response: Vec<QueryResponse>,

    /// Wrap the connection in TLS from the start.
    #[serde(default)]
    pub tls: bool,

    #[serde(default)]
    pub tls_config: TlsConfig,

    #[serde(flatten)]
    pub unknown: UnknownFields,
}

impl Schema for TcpProbe {
    const CONTEXT: &'static str = "tcp probe";

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }
}

strict_schema!(QueryResponse, TcpProbe);
