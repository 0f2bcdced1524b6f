//! Concurrently readable holder for the active configuration.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use super::Config;
use super::validation::ConfigError;

/// Holds the active [`Config`] and swaps it atomically on reload.
///
/// Readers get an `Arc` snapshot, so a reload never changes a configuration
/// a reader is already using. Decoding and validation happen before the
/// write lock is taken; the lock only guards the pointer swap.
#[derive(Debug, Default)]
pub struct SafeConfig {
    active: RwLock<Arc<Config>>,
}

impl SafeConfig {
    pub fn new(config: Config) -> Self {
        Self {
            active: RwLock::new(Arc::new(config)),
        }
    }

    /// Snapshot of the active configuration.
    pub fn current(&self) -> Arc<Config> {
        let guard = self.active.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the active configuration with an already validated one.
    pub fn replace(&self, config: Config) {
        let config = Arc::new(config);
        let mut guard = self.active.write().unwrap_or_else(PoisonError::into_inner);
        *guard = config;
    }

    /// Load, validate and activate the configuration at `path`.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or fails validation;
    /// the previously active configuration stays in effect.
    pub fn reload(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let config = Config::load(path).inspect_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "Failed to reload configuration");
        })?;

        tracing::info!(
            path = %path.display(),
            modules = config.modules.len(),
            "Loaded configuration"
        );
        self.replace(config);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Module, ProberKind};

    #[test]
    fn test_default_is_empty() {
        let safe = SafeConfig::default();
        assert!(safe.current().modules.is_empty());
    }

    #[test]
    fn test_replace_does_not_affect_existing_snapshot() {
        let mut first = Config::default();
        first
            .modules
            .insert("a".to_string(), Module::new(ProberKind::Tcp));
        let safe = SafeConfig::new(first);

        let snapshot = safe.current();
        safe.replace(Config::default());

        assert!(snapshot.modules.contains_key("a"));
        assert!(safe.current().modules.is_empty());
    }

    #[test]
    fn test_reload_missing_file_keeps_previous() {
        let mut first = Config::default();
        first
            .modules
            .insert("keep".to_string(), Module::new(ProberKind::Icmp));
        let safe = SafeConfig::new(first);

        let err = safe.reload("/nonexistent/sonde.yml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
        assert!(err.to_string().starts_with("Error reading config file: "));
        assert!(safe.current().modules.contains_key("keep"));
    }
}
