//! Engine configuration: generation bounds, display rounding and the
//! recommendation policy. Loadable from TOML; every key is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::types::{DEFAULT_GENERATIONS, MAX_GENERATIONS};

/// Thresholds that map a coefficient onto a risk band.
///
/// Each threshold is the inclusive lower bound of the next band up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationPolicy {
    pub low_moderate: f64,
    pub moderate: f64,
    pub high: f64,
    /// A "narrow founder base" note is added when the number of distinct
    /// common ancestors is strictly greater than this.
    pub narrow_founder_base_threshold: usize,
}

impl Default for RecommendationPolicy {
    fn default() -> Self {
        Self {
            low_moderate: 0.03,
            moderate: 0.0625,
            high: 0.125,
            narrow_founder_base_threshold: 3,
        }
    }
}

impl RecommendationPolicy {
    pub fn validate(&self) -> Result<()> {
        let thresholds = [self.low_moderate, self.moderate, self.high];
        if thresholds.iter().any(|t| !t.is_finite() || *t < 0.0 || *t > 1.0) {
            return Err(AnalysisError::Config(format!(
                "Band thresholds must lie in [0, 1], got {:?}",
                thresholds
            )));
        }
        if !(self.low_moderate < self.moderate && self.moderate < self.high) {
            return Err(AnalysisError::Config(format!(
                "Band thresholds must be strictly increasing, got {:?}",
                thresholds
            )));
        }
        Ok(())
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Generation bound used when a request omits one.
    pub default_generations: usize,
    /// Largest generation bound a request may ask for.
    pub max_generations: usize,
    /// Decimal places of the reported coefficient and diversity.
    pub display_decimals: u32,
    pub policy: RecommendationPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_generations: DEFAULT_GENERATIONS,
            max_generations: MAX_GENERATIONS,
            display_decimals: 4,
            policy: RecommendationPolicy::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse a TOML document. Missing keys take their default values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        log::debug!("Loaded analysis config from '{}'", path.display());
        Self::from_toml_str(&content)
    }

    /// Check internal consistency.
    ///
    /// # Errors
    /// Returns `Config` if the generation bounds are out of `[1, 10]` or
    /// inconsistent, or the policy thresholds are malformed.
    pub fn validate(&self) -> Result<()> {
        if self.max_generations == 0 || self.max_generations > MAX_GENERATIONS {
            return Err(AnalysisError::Config(format!(
                "max_generations must be in [1, {}], got {}",
                MAX_GENERATIONS, self.max_generations
            )));
        }
        if self.default_generations == 0 || self.default_generations > self.max_generations {
            return Err(AnalysisError::Config(format!(
                "default_generations must be in [1, {}], got {}",
                self.max_generations, self.default_generations
            )));
        }
        if self.display_decimals > 12 {
            return Err(AnalysisError::Config(format!(
                "display_decimals must be at most 12, got {}",
                self.display_decimals
            )));
        }
        self.policy.validate()
    }

    /// Round a value to the configured number of display decimals.
    pub fn round_for_display(&self, value: f64) -> f64 {
        let scale = 10f64.powi(self.display_decimals as i32);
        (value * scale).round() / scale
    }
}
