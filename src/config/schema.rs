//! Strict decoding shared by every structured configuration type.
//!
//! Each schema type captures the keys it does not recognize in an
//! [`UnknownFields`] catch-all and implements [`Schema`]. The
//! [`strict_schema!`] macro wires the derived decoder to [`check`], which
//! rejects leftover keys before running the type's semantic validation.
//! Because nested types decode while their parent decodes, the innermost
//! failure is the one reported.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while decoding or validating a schema type.
///
/// The `Display` text of each variant is part of the external contract and
/// is matched by operational tooling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Keys present in the document that the containing type does not define.
    #[error("unknown fields in {context}: {}", fields.join(", "))]
    UnknownFields {
        context: &'static str,
        fields: Vec<String>,
    },

    /// An option the current platform cannot honor.
    #[error("\"{option}\" is not supported on {platform} platforms")]
    Unsupported {
        option: &'static str,
        platform: &'static str,
    },

    #[error("Query name must be set for DNS module")]
    MissingQueryName,

    #[error("DN is required to query LDAP")]
    MissingDn,

    #[error("Invalid DN detected: {0}")]
    InvalidDn(String),

    #[error("Invalid filter detected: {0}")]
    InvalidFilter(String),

    #[error("Unknown scope type: {0}")]
    UnknownScope(String),

    #[error("Invalid regular expression in {context}: {pattern}")]
    InvalidRegex {
        context: &'static str,
        pattern: String,
    },
}

/// Catch-all for keys a schema type does not declare.
///
/// Always empty once a value has passed [`check`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnknownFields(BTreeMap<String, serde_yaml::Value>);

impl UnknownFields {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unknown key names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, key: impl Into<String>) {
        self.0.insert(key.into(), serde_yaml::Value::Null);
    }
}

/// A strictly decoded configuration type.
pub trait Schema {
    /// Name used in `unknown fields in <context>` errors.
    const CONTEXT: &'static str;

    /// Keys captured during decoding that matched no field.
    fn unknown_fields(&self) -> &UnknownFields;

    /// Semantic checks, run after the unknown-field check succeeds.
    ///
    /// Implementations may normalize defaults (for example an empty LDAP
    /// scope becomes `one`).
    fn validate(&mut self) -> Result<(), SchemaError> {
        Ok(())
    }
}

/// Run the strict-decode checks on a freshly decoded value.
///
/// # Errors
/// Returns [`SchemaError::UnknownFields`] if any key was not recognized,
/// otherwise whatever [`Schema::validate`] reports.
pub fn check<T: Schema>(mut value: T) -> Result<T, SchemaError> {
    let unknown = value.unknown_fields();
    if !unknown.is_empty() {
        return Err(SchemaError::UnknownFields {
            context: T::CONTEXT,
            fields: unknown.names(),
        });
    }
    value.validate()?;
    Ok(value)
}

/// Compile every pattern, reporting the first one that fails.
pub(crate) fn check_patterns(
    context: &'static str,
    patterns: &[String],
) -> Result<(), SchemaError> {
    for pattern in patterns {
        if regex::Regex::new(pattern).is_err() {
            return Err(SchemaError::InvalidRegex {
                context,
                pattern: pattern.clone(),
            });
        }
    }
    Ok(())
}

/// Implement `Serialize`/`Deserialize` for types declared with
/// `#[serde(remote = "Self")]`, routing decoding through [`check`].
macro_rules! strict_schema {
    ($($ty:ty),+ $(,)?) => {$(
        impl<'de> ::serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let decoded = <$ty>::deserialize(deserializer)?;
                $crate::config::schema::check(decoded).map_err(::serde::de::Error::custom)
            }
        }

        impl ::serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                <$ty>::serialize(self, serializer)
            }
        }
    )+};
}

pub(crate) use strict_schema;
