//! Configuration error types and shared parsing helpers.

use std::time::Duration;

use thiserror::Error;

/// Configuration error types.
///
/// Schema violations surface as [`ConfigError::ParseError`]; the wrapped
/// message carries the [`SchemaError`](super::SchemaError) text.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Error reading config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode or validate the YAML document.
    #[error("Error parsing config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Failed to render the configuration back to YAML.
    #[error("Error rendering config: {0}")]
    RenderError(serde_yaml::Error),
}

/// Parse duration string using humantime.
///
/// Supports various formats: `30s`, `1m`, `5m30s`, `1h`, `100ms`, etc.
///
/// # Examples
///
/// ```
/// use sonde::config::parse_duration;
///
/// assert_eq!(parse_duration("30s").unwrap().as_secs(), 30);
/// assert_eq!(parse_duration("1m").unwrap().as_secs(), 60);
/// assert_eq!(parse_duration("1h30m").unwrap().as_secs(), 5400);
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("duration string is empty".to_string());
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_valid() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("100ms").unwrap(), Duration::from_millis(100));
        assert_eq!(parse_duration(" 5s ").unwrap(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("30").is_err());
    }

    #[test]
    fn test_error_prefixes() {
        let io = ConfigError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        assert_eq!(io.to_string(), "Error reading config file: missing");

        let parse = ConfigError::from(serde_yaml::from_str::<u8>("x").unwrap_err());
        assert!(parse.to_string().starts_with("Error parsing config file: "));
    }
}
