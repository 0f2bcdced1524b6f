//! HTTP module configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::schema::{Schema, SchemaError, UnknownFields, check_patterns, strict_schema};
use super::secret::Secret;
use super::tls::{BasicAuth, TlsConfig};

/// Client options inlined into the `http` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpClientConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<BasicAuth>,

    #[serde(default, skip_serializing_if = "Secret::is_empty")]
    pub bearer_token: Secret,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bearer_token_file: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub proxy_url: String,

    #[serde(default)]
    pub tls_config: TlsConfig,
}

/// HTTP prober settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct HttpProbe {
    /// Accepted status codes; any 2xx when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub valid_status_codes: Vec<u16>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub valid_http_versions: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub preferred_ip_protocol: String,

    #[serde(default)]
    pub no_follow_redirects: bool,

    #[serde(default)]
    pub fail_if_ssl: bool,

    #[serde(default)]
    pub fail_if_not_ssl: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub method: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fail_if_matches_regexp: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fail_if_not_matches_regexp: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,

    #[serde(flatten)]
    pub client: HttpClientConfig,

    // Must stay after `client` so the client options are consumed first.
    #[serde(flatten)]
    pub unknown: UnknownFields,
}

impl Schema for HttpProbe {
    const CONTEXT: &'static str = "http probe";

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }

    fn validate(&mut self) -> Result<(), SchemaError> {
        check_patterns(Self::CONTEXT, &self.fail_if_matches_regexp)?;
        check_patterns(Self::CONTEXT, &self.fail_if_not_matches_regexp)
    }
}

strict_schema!(HttpProbe);
