//! Page configuration.
//!
//! Raw TOML deserialization structs (with `Option` fields) stay private;
//! loading resolves them into validated types at the parse boundary. The
//! defaults are the tuned values this page family ships with.
//!
//! ```toml
//! [retry]
//! max_attempts = 12
//! interval_ms = 120
//!
//! [margins]
//! default = "900px"
//! about = "1200px"
//! footer = "800px"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::nav::RetryPolicy;
use crate::types::{Margin, SectionId};

// =============================================================================
// Raw (deserialization) layer
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    retry: Option<RawRetry>,
    margins: Option<RawMargins>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRetry {
    max_attempts: Option<u32>,
    interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMargins {
    default: Option<String>,
    about: Option<String>,
    footer: Option<String>,
}

// =============================================================================
// Resolved layer
// =============================================================================

/// Per-section proximity margins.
///
/// The about section sits directly under the tall hero, so it gets a wider
/// margin than the rest; the footer gets a slightly narrower one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginPlan {
    pub default: Margin,
    pub about: Margin,
    pub footer: Margin,
}

impl MarginPlan {
    /// Margin for a deferred navigable section.
    pub fn margin_for(&self, section: SectionId) -> Margin {
        match section {
            SectionId::About => self.about,
            _ => self.default,
        }
    }
}

impl Default for MarginPlan {
    fn default() -> Self {
        Self {
            default: Margin::DEFAULT,
            about: Margin::px_value(1200.0),
            footer: Margin::px_value(800.0),
        }
    }
}

/// Validated page configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageConfig {
    pub retry: RetryPolicy,
    pub margins: MarginPlan,
}

impl PageConfig {
    /// Parse and validate a TOML document. Absent tables and keys keep
    /// their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;
        let mut config = PageConfig::default();

        if let Some(retry) = raw.retry {
            if let Some(attempts) = retry.max_attempts {
                if attempts == 0 {
                    return Err(ConfigError::InvalidRetry);
                }
                config.retry.max_attempts = attempts;
            }
            if let Some(ms) = retry.interval_ms {
                config.retry.interval = Duration::from_millis(ms);
            }
        }

        if let Some(margins) = raw.margins {
            if let Some(raw) = margins.default {
                config.margins.default = resolve_margin(&raw)?;
            }
            if let Some(raw) = margins.about {
                config.margins.about = resolve_margin(&raw)?;
            }
            if let Some(raw) = margins.footer {
                config.margins.footer = resolve_margin(&raw)?;
            }
        }

        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

fn resolve_margin(raw: &str) -> Result<Margin, ConfigError> {
    Margin::parse(raw).ok_or_else(|| ConfigError::InvalidMargin(raw.to_string()))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PageConfig::default();
        assert_eq!(config.retry.max_attempts, 12);
        assert_eq!(config.retry.interval, Duration::from_millis(120));
        assert_eq!(config.margins.default, Margin::px_value(900.0));
        assert_eq!(config.margins.about, Margin::px_value(1200.0));
        assert_eq!(config.margins.footer, Margin::px_value(800.0));
    }

    #[test]
    fn test_empty_document_keeps_defaults() {
        let config = PageConfig::from_toml_str("").unwrap();
        assert_eq!(config, PageConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = PageConfig::from_toml_str(
            r#"
            [retry]
            max_attempts = 6

            [margins]
            about = "1500px"
            "#,
        )
        .unwrap();

        assert_eq!(config.retry.max_attempts, 6);
        assert_eq!(config.retry.interval, Duration::from_millis(120));
        assert_eq!(config.margins.about, Margin::px_value(1500.0));
        assert_eq!(config.margins.default, Margin::px_value(900.0));
    }

    #[test]
    fn test_full_override() {
        let config = PageConfig::from_toml_str(
            r#"
            [retry]
            max_attempts = 20
            interval_ms = 50

            [margins]
            default = "600px"
            about = "900"
            footer = "0px"
            "#,
        )
        .unwrap();

        assert_eq!(config.retry.max_attempts, 20);
        assert_eq!(config.retry.interval, Duration::from_millis(50));
        assert_eq!(config.margins.default, Margin::px_value(600.0));
        assert_eq!(config.margins.about, Margin::px_value(900.0));
        assert_eq!(config.margins.footer, Margin::px_value(0.0));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let result = PageConfig::from_toml_str("[retry]\nmax_attempts = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidRetry)));
    }

    #[test]
    fn test_invalid_margin_rejected() {
        let result = PageConfig::from_toml_str("[margins]\ndefault = \"-40px\"\n");
        match result {
            Err(ConfigError::InvalidMargin(raw)) => assert_eq!(raw, "-40px"),
            other => panic!("expected InvalidMargin, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result = PageConfig::from_toml_str("[retry\nmax_attempts = 3");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_margin_for_section() {
        let margins = MarginPlan::default();
        assert_eq!(margins.margin_for(SectionId::About), margins.about);
        assert_eq!(margins.margin_for(SectionId::Skills), margins.default);
        assert_eq!(margins.margin_for(SectionId::Projects), margins.default);
        assert_eq!(margins.margin_for(SectionId::Contact), margins.default);
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[retry]\nmax_attempts = 3\ninterval_ms = 80\n").unwrap();

        let config = PageConfig::load(file.path()).unwrap();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.interval, Duration::from_millis(80));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = PageConfig::load("/nonexistent/viewgate.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
