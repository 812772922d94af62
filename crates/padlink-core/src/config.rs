//! Immutable session configuration snapshot.
//!
//! The surrounding settings layer builds a [`SessionConfig`] once per session
//! and hands it to the core.  The core never mutates it and applies no
//! defaults of its own: reloading settings means starting a new session.
//!
//! Bad values (a zero tap delay, a NaN sensitivity) are programmer or user
//! errors, not runtime conditions, so [`SessionConfig::validate`] is meant to
//! be called at session start and the session refused if it fails.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejection reasons from [`SessionConfig::validate`], one per field.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("host must not be empty")]
    EmptyHost,

    #[error("port must be between 1 and 65535")]
    InvalidPort,

    #[error("tap delay must be greater than zero")]
    InvalidTapDelay,

    #[error("tap tolerance must be a finite, non-negative number of pixels (got {0})")]
    InvalidTapTolerance(f32),

    #[error("sensitivity must be a finite, positive number (got {0})")]
    InvalidSensitivity(f32),

    #[error("acceleration exponent must be a finite, positive number (got {0})")]
    InvalidAccelerationExponent(f32),

    #[error("scroll threshold must be a finite, positive number (got {0})")]
    InvalidScrollThreshold(f32),
}

/// Everything the core needs to know about the user's preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Host name or IP address of the receiving daemon.
    pub host: String,
    pub port: u16,
    /// Longest stationary contact still treated as a tap.
    pub tap_delay_ms: u64,
    /// Largest drift, per axis, still treated as stationary.
    pub tap_tolerance_px: f32,
    /// Linear multiplier applied to accelerated cursor motion.
    pub sensitivity: f32,
    /// Exponent of the velocity curve; 1.0 is linear.
    pub acceleration_exponent: f32,
    /// Accumulated two-finger displacement per wheel notch.
    pub scroll_threshold: f32,
}

impl SessionConfig {
    /// Checks every field and returns the first problem found.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] variant naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.tap_delay_ms == 0 {
            return Err(ConfigError::InvalidTapDelay);
        }
        if !self.tap_tolerance_px.is_finite() || self.tap_tolerance_px < 0.0 {
            return Err(ConfigError::InvalidTapTolerance(self.tap_tolerance_px));
        }
        if !is_positive(self.sensitivity) {
            return Err(ConfigError::InvalidSensitivity(self.sensitivity));
        }
        if !is_positive(self.acceleration_exponent) {
            return Err(ConfigError::InvalidAccelerationExponent(
                self.acceleration_exponent,
            ));
        }
        if !is_positive(self.scroll_threshold) {
            return Err(ConfigError::InvalidScrollThreshold(self.scroll_threshold));
        }
        Ok(())
    }
}

fn is_positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> SessionConfig {
        SessionConfig {
            host: "192.168.1.20".to_string(),
            port: 64296,
            tap_delay_ms: 200,
            tap_tolerance_px: 10.0,
            sensitivity: 1.0,
            acceleration_exponent: 1.0,
            scroll_threshold: 20.0,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert_eq!(valid().validate(), Ok(()));
    }

    #[test]
    fn test_each_invalid_field_has_its_own_error() {
        let cases: Vec<(SessionConfig, ConfigError)> = vec![
            (
                SessionConfig { host: "  ".into(), ..valid() },
                ConfigError::EmptyHost,
            ),
            (SessionConfig { port: 0, ..valid() }, ConfigError::InvalidPort),
            (
                SessionConfig { tap_delay_ms: 0, ..valid() },
                ConfigError::InvalidTapDelay,
            ),
            (
                SessionConfig { tap_tolerance_px: -1.0, ..valid() },
                ConfigError::InvalidTapTolerance(-1.0),
            ),
            (
                SessionConfig { sensitivity: 0.0, ..valid() },
                ConfigError::InvalidSensitivity(0.0),
            ),
            (
                SessionConfig { acceleration_exponent: -2.0, ..valid() },
                ConfigError::InvalidAccelerationExponent(-2.0),
            ),
            (
                SessionConfig { scroll_threshold: f32::INFINITY, ..valid() },
                ConfigError::InvalidScrollThreshold(f32::INFINITY),
            ),
        ];

        for (config, expected) in cases {
            assert_eq!(config.validate(), Err(expected));
        }
    }

    #[test]
    fn test_nan_sensitivity_is_rejected() {
        let config = SessionConfig { sensitivity: f32::NAN, ..valid() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSensitivity(_))
        ));
    }

    #[test]
    fn test_zero_tolerance_is_allowed() {
        let config = SessionConfig { tap_tolerance_px: 0.0, ..valid() };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_config_survives_toml() {
        // Arrange
        let original = valid();

        // Act
        let text = toml::to_string(&original).unwrap();
        let parsed: SessionConfig = toml::from_str(&text).unwrap();

        // Assert
        assert_eq!(parsed, original);
    }
}
