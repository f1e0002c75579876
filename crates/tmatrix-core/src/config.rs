//! Generation settings.
//!
//! Loaded from JSON; every field is optional and falls back to its default.
//!
//! ```json
//! { "mode": "aetg", "seed": 7, "level": 3, "limits": { "max_obligations": 50000 } }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown matrix mode '{0}' (expected 'aetg' or 'matrix')")]
    UnknownMode(String),

    #[error("coverage level must be at least 1")]
    InvalidLevel,

    #[error("attempts must be at least 1")]
    ZeroAttempts,

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// How cases are produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatrixMode {
    /// Greedy t-wise covering array.
    #[default]
    Aetg,
    /// Full cartesian product.
    Matrix,
}

impl MatrixMode {
    pub fn as_str(self) -> &'static str {
        match self {
            MatrixMode::Aetg => "aetg",
            MatrixMode::Matrix => "matrix",
        }
    }
}

impl fmt::Display for MatrixMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatrixMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aetg" => Ok(MatrixMode::Aetg),
            "matrix" => Ok(MatrixMode::Matrix),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

/// Caps checked before any generation work starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixLimits {
    /// Maximum obligations the covering array may have to track.
    pub max_obligations: usize,
    /// Maximum rows of a full cartesian product.
    pub max_matrix_cases: usize,
}

impl Default for MatrixLimits {
    fn default() -> Self {
        Self {
            max_obligations: 1_000_000,
            max_matrix_cases: 1_000_000,
        }
    }
}

/// Settings for one generated matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    pub mode: MatrixMode,
    /// RNG seed for `aetg` mode. `None` seeds from system entropy.
    pub seed: Option<u64>,
    /// Combination size to cover (2 = pairwise).
    pub level: usize,
    /// Independent `aetg` runs; the smallest result is kept.
    pub attempts: u32,
    pub limits: MatrixLimits,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            mode: MatrixMode::Aetg,
            seed: Some(0),
            level: 2,
            attempts: 1,
            limits: MatrixLimits::default(),
        }
    }
}

impl MatrixConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.level == 0 {
            return Err(ConfigError::InvalidLevel);
        }
        if self.attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(())
    }

    pub fn with_mode(mut self, mode: MatrixMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_level(mut self, level: usize) -> Self {
        self.level = level;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MatrixConfig::default();
        assert_eq!(config.mode, MatrixMode::Aetg);
        assert_eq!(config.seed, Some(0));
        assert_eq!(config.level, 2);
        assert_eq!(config.attempts, 1);
        assert_eq!(config.limits.max_obligations, 1_000_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mode_from_str_ignores_case() {
        assert_eq!("AETG".parse::<MatrixMode>().unwrap(), MatrixMode::Aetg);
        assert_eq!("Matrix".parse::<MatrixMode>().unwrap(), MatrixMode::Matrix);
        assert!(matches!(
            "full".parse::<MatrixMode>(),
            Err(ConfigError::UnknownMode(ref m)) if m == "full"
        ));
    }

    #[test]
    fn test_mode_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&MatrixMode::Matrix).unwrap(),
            "\"matrix\""
        );
        let mode: MatrixMode = serde_json::from_str("\"aetg\"").unwrap();
        assert_eq!(mode, MatrixMode::Aetg);
        assert_eq!(MatrixMode::Matrix.to_string(), "matrix");
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            MatrixConfig::from_json(r#"{ "mode": "matrix", "limits": { "max_matrix_cases": 10 } }"#)
                .unwrap();
        assert_eq!(config.mode, MatrixMode::Matrix);
        assert_eq!(config.seed, Some(0));
        assert_eq!(config.limits.max_matrix_cases, 10);
        assert_eq!(config.limits.max_obligations, 1_000_000);
    }

    #[test]
    fn test_null_seed_means_entropy() {
        let config = MatrixConfig::from_json(r#"{ "seed": null }"#).unwrap();
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        assert!(matches!(
            MatrixConfig::from_json(r#"{ "level": 0 }"#),
            Err(ConfigError::InvalidLevel)
        ));
        assert!(matches!(
            MatrixConfig::from_json(r#"{ "attempts": 0 }"#),
            Err(ConfigError::ZeroAttempts)
        ));
        assert!(matches!(
            MatrixConfig::from_json(r#"{ "mode": "full" }"#),
            Err(ConfigError::Json(_))
        ));
    }
}
