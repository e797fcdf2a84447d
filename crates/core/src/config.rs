//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Request handlers never read environment variables themselves.

use crate::constants::DEFAULT_EXPORT_PREFIX;
use crate::error::{CoreError, CoreResult};
use crate::export::Exporter;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    export_prefix: String,
    seed_sample_data: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            export_prefix: DEFAULT_EXPORT_PREFIX.to_owned(),
            seed_sample_data: true,
        }
    }
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// The export prefix ends up in file names, so it must be non-blank and may only contain
    /// ASCII letters, digits, `-` and `_`.
    pub fn new(export_prefix: String, seed_sample_data: bool) -> CoreResult<Self> {
        let export_prefix = export_prefix.trim().to_owned();
        if export_prefix.is_empty() {
            return Err(CoreError::InvalidInput(
                "export_prefix cannot be empty".into(),
            ));
        }
        if !export_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(CoreError::InvalidInput(format!(
                "export_prefix {export_prefix:?} contains characters not allowed in file names"
            )));
        }

        Ok(Self {
            export_prefix,
            seed_sample_data,
        })
    }

    pub fn export_prefix(&self) -> &str {
        &self.export_prefix
    }

    pub fn seed_sample_data(&self) -> bool {
        self.seed_sample_data
    }

    pub fn exporter(&self) -> Exporter {
        Exporter::new(self.export_prefix.clone())
    }
}

/// Parse the seed flag from an optional string value.
///
/// If `value` is `None` or empty/whitespace, sample data is seeded.
pub fn seed_sample_data_from_env_value(value: Option<String>) -> CoreResult<bool> {
    let value = value
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty());
    match value.as_deref() {
        None | Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(CoreError::InvalidInput(format!(
            "TELEMED_SEED_SAMPLE_DATA must be true or false, got {other:?}"
        ))),
    }
}

/// Parse the export prefix from an optional string value, defaulting to `telemed`.
pub fn export_prefix_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_EXPORT_PREFIX.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_flag_parsing() {
        assert!(seed_sample_data_from_env_value(None).unwrap());
        assert!(seed_sample_data_from_env_value(Some("  ".into())).unwrap());
        assert!(seed_sample_data_from_env_value(Some("YES".into())).unwrap());
        assert!(!seed_sample_data_from_env_value(Some("false".into())).unwrap());
        assert!(!seed_sample_data_from_env_value(Some("0".into())).unwrap());

        let err = seed_sample_data_from_env_value(Some("maybe".into())).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(msg) if msg.contains("maybe")));
    }

    #[test]
    fn test_export_prefix_defaults() {
        assert_eq!(export_prefix_from_env_value(None), "telemed");
        assert_eq!(export_prefix_from_env_value(Some(" ".into())), "telemed");
        assert_eq!(export_prefix_from_env_value(Some(" clinic ".into())), "clinic");
    }

    #[test]
    fn test_new_rejects_unsafe_prefix() {
        assert!(CoreConfig::new("clinic_2025".into(), true).is_ok());

        let err = CoreConfig::new("  ".into(), true).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(msg) if msg.contains("cannot be empty")));

        let err = CoreConfig::new("../etc".into(), true).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(msg) if msg.contains("not allowed")));
    }

    #[test]
    fn test_exporter_uses_prefix() {
        let cfg = CoreConfig::new("clinic".into(), false).unwrap();
        assert_eq!(cfg.exporter().prefix(), "clinic");
        assert!(!cfg.seed_sample_data());
    }
}
