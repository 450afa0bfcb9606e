//! Error taxonomy.
//!
//! The runtime core absorbs its own failures (a missed scroll or an eagerly
//! mounted section is cosmetic), so errors only surface at two seams: the
//! environment port's observation setup, and configuration loading.

use thiserror::Error;

/// Failures reported by the hosting environment.
#[derive(Debug, Clone, Error)]
pub enum EnvError {
    /// The proximity-observation mechanism is unavailable.
    ///
    /// Consumers must fail open: treat the region as immediately proximate
    /// and mount, rather than never mounting.
    #[error("proximity observation unavailable: {0}")]
    ObservationUnavailable(String),
}

/// Failures while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid margin {0:?}: expected a non-negative pixel distance like \"900px\"")]
    InvalidMargin(String),

    #[error("retry max_attempts must be at least 1")]
    InvalidRetry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_error_message_names_fallback_input() {
        let err = EnvError::ObservationUnavailable("no observer support".into());
        assert!(err.to_string().contains("no observer support"));
    }

    #[test]
    fn test_config_error_invalid_margin_echoes_input() {
        let err = ConfigError::InvalidMargin("-3px".into());
        assert!(err.to_string().contains("-3px"));
    }
}
