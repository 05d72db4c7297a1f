//! Configuration errors.
//!
//! Only construction and config loading can fail. The per-tick pipeline
//! resolves every degenerate case with a fallback value instead.

use thiserror::Error;

/// Errors raised while loading or validating a locomotion configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },

    #[error("A creature needs at least one leg")]
    NoLegs,

    #[error("Orientation pair [{a}, {b}] references a leg outside 0..{leg_count}")]
    PairOutOfRange { a: usize, b: usize, leg_count: usize },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_message_names_field() {
        let err = ConfigError::invalid("step_size", "must be > 0, got -1");
        assert_eq!(
            err.to_string(),
            "Invalid value for step_size: must be > 0, got -1"
        );
    }

    #[test]
    fn pair_out_of_range_message() {
        let err = ConfigError::PairOutOfRange {
            a: 0,
            b: 9,
            leg_count: 8,
        };
        assert!(err.to_string().contains("[0, 9]"));
        assert!(err.to_string().contains("0..8"));
    }
}
