use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::retry::RetryPolicy;

/// Event source used when publishing change sets.
pub const DEFAULT_EVENT_SOURCE: &str = "virtwallet";

/// Event type used when publishing change sets.
pub const DEFAULT_EVENT_DETAIL_TYPE: &str = "new account version";

/// Configuration for the versioning subsystem.
///
/// Every field has a default, so a TOML file only needs to list what it
/// overrides:
///
/// ```toml
/// id_width = 3
///
/// [retry]
/// max_retries = 5
///
/// [retry.backoff]
/// initial_delay_ms = 10
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Version counter retry budget and backoff.
    pub retry: RetryPolicy,
    /// `source` of published change set events.
    pub event_source: String,
    /// `detail_type` of published change set events.
    pub event_detail_type: String,
    /// Zero-padding width of allocated entity identifiers.
    pub id_width: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            event_source: DEFAULT_EVENT_SOURCE.into(),
            event_detail_type: DEFAULT_EVENT_DETAIL_TYPE.into(),
            id_width: 2,
        }
    }
}

impl LedgerConfig {
    pub fn from_toml_str(s: &str) -> LedgerResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.event_source.is_empty() {
            return Err(LedgerError::Config("event_source must not be empty".into()));
        }
        if self.event_detail_type.is_empty() {
            return Err(LedgerError::Config("event_detail_type must not be empty".into()));
        }
        if self.id_width == 0 {
            return Err(LedgerError::Config("id_width must be at least 1".into()));
        }
        let backoff = &self.retry.backoff;
        if !(0.0..=1.0).contains(&backoff.jitter_factor) {
            return Err(LedgerError::Config("jitter_factor must be within 0.0..=1.0".into()));
        }
        if backoff.multiplier < 1.0 {
            return Err(LedgerError::Config("multiplier must be at least 1.0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = LedgerConfig::default();
        assert_eq!(c.retry.max_retries, 3);
        assert_eq!(c.event_source, "virtwallet");
        assert_eq!(c.event_detail_type, "new account version");
        assert_eq!(c.id_width, 2);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn empty_toml_is_default() {
        let c = LedgerConfig::from_toml_str("").unwrap();
        assert_eq!(c, LedgerConfig::default());
    }

    #[test]
    fn partial_override() {
        let c = LedgerConfig::from_toml_str(
            r#"
            id_width = 3

            [retry]
            max_retries = 5

            [retry.backoff]
            initial_delay_ms = 10
            "#,
        )
        .unwrap();
        assert_eq!(c.id_width, 3);
        assert_eq!(c.retry.max_retries, 5);
        assert_eq!(c.retry.backoff.initial_delay_ms, 10);
        assert_eq!(c.retry.backoff.max_delay_ms, 500);
        assert_eq!(c.event_source, "virtwallet");
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(matches!(
            LedgerConfig::from_toml_str("id_width = 0"),
            Err(LedgerError::Config(_))
        ));
        assert!(matches!(
            LedgerConfig::from_toml_str("[retry.backoff]\njitter_factor = 1.5"),
            Err(LedgerError::Config(_))
        ));
        assert!(matches!(
            LedgerConfig::from_toml_str("event_source = 7"),
            Err(LedgerError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = LedgerConfig::from_file("/nonexistent/ledger.toml").unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }
}
