use serde::{Deserialize, Serialize};

use crate::{ConfigError, DEFAULT_MARKER_ATTRIBUTE};

/// Correction endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://bot.w3datanet.com/grammar-checker/check";

/// Label of the correction button.
pub const DEFAULT_LABEL: &str = "Correct Text";

/// Stacking order of the floating controls.
pub const DEFAULT_Z_INDEX: u32 = 100_000;

/// How a successful correction reaches the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    /// Write the corrected text straight into the surface
    #[default]
    Replace,
    /// Show a diff panel, then write the corrected text
    Preview,
}

/// Verbosity of the console log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Configuration for the content script
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetouchConfig {
    /// URL of the correction endpoint
    pub endpoint: String,

    /// Whether corrections are previewed as a diff before being applied
    pub presentation: Presentation,

    /// Text of the correction button
    pub label: String,

    /// Attribute written onto every processed surface
    pub marker_attribute: String,

    /// CSS `z-index` of the button and the diff panel
    pub z_index: u32,

    /// Minimum level of log events written to the console
    pub log_level: LogLevel,
}

impl Default for RetouchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            presentation: Presentation::default(),
            label: DEFAULT_LABEL.to_string(),
            marker_attribute: DEFAULT_MARKER_ATTRIBUTE.to_string(),
            z_index: DEFAULT_Z_INDEX,
            log_level: LogLevel::default(),
        }
    }
}

impl RetouchConfig {
    /// Parse a JSON document; omitted fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The defaults, overridden by `json` when present.
    pub fn from_optional_json(json: Option<&str>) -> Result<Self, ConfigError> {
        match json.map(str::trim) {
            Some(json) if !json.is_empty() => Self::from_json(json),
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn it_fills_omitted_fields_with_defaults() -> TestResult {
        let config = RetouchConfig::from_json(
            r#"{ "endpoint": "http://localhost:9000/check", "presentation": "preview" }"#,
        )?;

        assert_eq!(config.endpoint, "http://localhost:9000/check");
        assert_eq!(config.presentation, Presentation::Preview);
        assert_eq!(config.label, DEFAULT_LABEL);
        assert_eq!(config.marker_attribute, DEFAULT_MARKER_ATTRIBUTE);
        assert_eq!(config.z_index, DEFAULT_Z_INDEX);
        Ok(())
    }

    #[test]
    fn it_falls_back_to_defaults_without_overrides() -> TestResult {
        assert_eq!(RetouchConfig::from_optional_json(None)?, RetouchConfig::default());
        assert_eq!(
            RetouchConfig::from_optional_json(Some("  "))?,
            RetouchConfig::default()
        );
        Ok(())
    }

    #[test]
    fn it_rejects_unknown_presentations() {
        assert!(matches!(
            RetouchConfig::from_json(r#"{ "presentation": "modal" }"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
