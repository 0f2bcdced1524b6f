//! DNS module configuration.

use serde::{Deserialize, Serialize};

use super::schema::{Schema, SchemaError, UnknownFields, check_patterns, strict_schema};

/// Regular expressions applied to one section of a DNS response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct DnsRrValidator {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fail_if_matches_regexp: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fail_if_not_matches_regexp: Vec<String>,

    #[serde(flatten)]
    pub unknown: UnknownFields,
}

impl Schema for DnsRrValidator {
    const CONTEXT: &'static str = "dns rr validator";

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }

    fn validate(&mut self) -> Result<(), SchemaError> {
        check_patterns(Self::CONTEXT, &self.fail_if_matches_regexp)?;
        check_patterns(Self::CONTEXT, &self.fail_if_not_matches_regexp)
    }
}

/// DNS prober settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct DnsProbe {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub preferred_ip_protocol: String,

    /// `udp` or `tcp`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub transport_protocol: String,

    /// Name to resolve. Required.
    #[serde(default)]
    pub query_name: String,

    /// Record type, `ANY` when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query_type: String,

    /// Accepted response codes, `NOERROR` when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub valid_rcodes: Vec<String>,

    #[serde(default, rename = "validate_answer_rrs")]
    pub validate_answer: DnsRrValidator,

    #[serde(default, rename = "validate_authority_rrs")]
    pub validate_authority: DnsRrValidator,

    #[serde(default, rename = "validate_additional_rrs")]
    pub validate_additional: DnsRrValidator,

    #[serde(flatten)]
    pub unknown: UnknownFields,
}

impl Schema for DnsProbe {
    const CONTEXT: &'static str = "dns probe";

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }

    fn validate(&mut self) -> Result<(), SchemaError> {
        if self.query_name.is_empty() {
            return Err(SchemaError::MissingQueryName);
        }
        Ok(())
    }
}

strict_schema!(DnsRrValidator, DnsProbe);
