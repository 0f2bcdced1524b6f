//! Client-side TLS and authentication settings shared by HTTP and TCP modules.
//!
//! Only decoded and validated here; the probers that consume them own the
//! handshake details.

use serde::{Deserialize, Serialize};

use super::schema::{Schema, UnknownFields, strict_schema};
use super::secret::Secret;

/// TLS client configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct TlsConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ca_file: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cert_file: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key_file: String,

    /// Overrides the name used for SNI and certificate verification.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server_name: String,

    #[serde(default)]
    pub insecure_skip_verify: bool,

    #[serde(flatten)]
    pub unknown: UnknownFields,
}

impl Schema for TlsConfig {
    const CONTEXT: &'static str = "tls config";

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }
}

/// HTTP basic authentication credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct BasicAuth {
    #[serde(default)]
    pub username: String,

    #[serde(default, skip_serializing_if = "Secret::is_empty")]
    pub password: Secret,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password_file: String,

    #[serde(flatten)]
    pub unknown: UnknownFields,
}

impl Schema for BasicAuth {
    const CONTEXT: &'static str = "basic auth";

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }
}

strict_schema!(TlsConfig, BasicAuth);
