//! ICMP module configuration.

use serde::{Deserialize, Serialize};

use super::schema::{Schema, SchemaError, UnknownFields, strict_schema};

/// Whether the current platform can set the IP "don't fragment" bit on
/// ICMP echo requests.
pub const DONT_FRAGMENT_SUPPORTED: bool = !cfg!(windows);

/// ICMP prober settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct IcmpProbe {
    /// `ip4` or `ip6`; `ip6` when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub preferred_ip_protocol: String,

    #[serde(default)]
    pub payload_size: usize,

    #[serde(default)]
    pub dont_fragment: bool,

    #[serde(flatten)]
    pub unknown: UnknownFields,
}

impl IcmpProbe {
    /// Platform capability check for `dont_fragment`.
    ///
    /// Split from [`Schema::validate`] so the rule can be exercised for any
    /// platform.
    pub fn check_platform(&self, dont_fragment_supported: bool) -> Result<(), SchemaError> {
        if self.dont_fragment && !dont_fragment_supported {
            return Err(SchemaError::Unsupported {
                option: "dont_fragment",
                platform: "windows",
            });
        }
        Ok(())
    }
}

impl Schema for IcmpProbe {
    const CONTEXT: &'static str = "icmp probe";

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }

    fn validate(&mut self) -> Result<(), SchemaError> {
        self.check_platform(DONT_FRAGMENT_SUPPORTED)
    }
}

strict_schema!(IcmpProbe);
