use std::{fs, path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{achieved::DEFAULT_CAPACITY, tree::search_tree::TreeParams};

const DEFAULT_PLANNER_CONFIG_YAML: &str = include_str!("../../config/planner.default.yaml");

/// Configuration for one planning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Iteration budget for `run`.
    pub iterations: usize,
    pub max_depth: u64,
    /// Worker threads used for template application.
    pub workers: usize,
    pub epsilon: f64,
    pub exploration: f64,
    pub achieved_capacity: usize,
    /// Rolling checkpoint every this many iterations; 0 disables it.
    pub checkpoint_interval: usize,
    /// Upper bound on each wait for a worker result.
    pub collect_timeout_ms: u64,
    /// Abort after this many consecutive failed template lookups; 0 disables the breaker.
    pub max_consecutive_failures: usize,
    pub seed: u64,
    pub output_dir: PathBuf,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            iterations: 10_000,
            max_depth: 5,
            workers: 12,
            epsilon: 0.05,
            exploration: std::f64::consts::SQRT_2,
            achieved_capacity: DEFAULT_CAPACITY,
            checkpoint_interval: 100,
            collect_timeout_ms: 30_000,
            max_consecutive_failures: 10,
            seed: 11,
            output_dir: PathBuf::from("."),
        }
    }
}

impl PlannerConfig {
    /// Parse a planner config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: PlannerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a planner config from a YAML file path.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Return the default YAML config bundled with this crate.
    pub fn default_yaml() -> &'static str {
        DEFAULT_PLANNER_CONFIG_YAML
    }

    pub fn from_default_yaml() -> Result<Self, ConfigError> {
        Self::from_yaml_str(Self::default_yaml())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::Invalid(
                "iterations must be greater than 0".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_depth must be greater than 0".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid(
                "workers must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(ConfigError::Invalid(
                "epsilon must lie in [0, 1]".to_string(),
            ));
        }
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(ConfigError::Invalid(
                "exploration must be finite and >= 0".to_string(),
            ));
        }
        if self.achieved_capacity == 0 {
            return Err(ConfigError::Invalid(
                "achieved_capacity must be greater than 0".to_string(),
            ));
        }
        if self.collect_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "collect_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn collect_timeout(&self) -> Duration {
        Duration::from_millis(self.collect_timeout_ms)
    }

    pub(crate) fn tree_params(&self) -> TreeParams {
        TreeParams {
            epsilon: self.epsilon,
            max_depth: self.max_depth,
            exploration: self.exploration,
            seed: self.seed,
        }
    }
}

/// Error type for loading and validating `PlannerConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid planner config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_yaml_matches_defaults() {
        let config = PlannerConfig::from_default_yaml().expect("bundled config parses");
        assert_eq!(config, PlannerConfig::default());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = PlannerConfig::from_yaml_str("iterations: 7\nworkers: 2\n").unwrap();
        assert_eq!(config.iterations, 7);
        assert_eq!(config.workers, 2);
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.seed, 11);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for yaml in ["iterations: 0", "workers: 0", "epsilon: 1.5", "exploration: -1.0"] {
            let err = PlannerConfig::from_yaml_str(yaml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{yaml} should be invalid");
        }
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = PlannerConfig::from_yaml_str("iterations: [").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }
}
