use serde::Deserialize;
use std::path::Path;

use crate::{AnalysisError, Result};

/// Monotonic compression applied to every raw edit cost before it enters
/// the cost matrix, so large leaps do not dominate linearly.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalingFunction {
    #[default]
    Sqrt,
    FlooredSqrt,
    Linear,
}

impl ScalingFunction {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            ScalingFunction::Sqrt => value.sqrt(),
            ScalingFunction::FlooredSqrt => value.sqrt().floor(),
            ScalingFunction::Linear => value,
        }
    }
}

/// Penalty and tolerance constants for the edit operations. Fixed for the
/// duration of a matching run.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CostTuning {
    /// Multiplies the magnitude of a step aligned against a rest.
    pub rest_penalty_factor: f64,
    /// Multiplies the step difference when the two steps move in opposite directions.
    pub inversion_penalty_factor: f64,
    /// Step differences up to this many semitones are free.
    pub replacement_tolerance: f64,
    /// Added to every single-token insertion or deletion.
    pub insertion_penalty: f64,
}

impl Default for CostTuning {
    fn default() -> Self {
        CostTuning {
            rest_penalty_factor: 5.0,
            inversion_penalty_factor: 2.0,
            replacement_tolerance: 0.0,
            insertion_penalty: 0.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AnalyzerConfig {
    /// Highest normalized alignment cost still accepted as a match.
    pub sensitivity: f64,
    /// Fewest notes a match may span.
    pub min_match: usize,
    /// Stream windows hold at most `padding_factor` times as many tokens as the pattern.
    pub padding_factor: usize,
    pub scaling: ScalingFunction,
    pub tuning: CostTuning,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            sensitivity: 0.3,
            min_match: 4,
            padding_factor: 2,
            scaling: ScalingFunction::default(),
            tuning: CostTuning::default(),
        }
    }
}

impl AnalyzerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: AnalyzerConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sensitivity >= 0.0) {
            return Err(AnalysisError::Config(format!("sensitivity must be non-negative, got {}", self.sensitivity)));
        }
        if self.min_match < 1 {
            return Err(AnalysisError::Config("min-match must be at least 1".to_string()));
        }
        if self.padding_factor < 1 {
            return Err(AnalysisError::Config("padding-factor must be at least 1".to_string()));
        }
        let t = &self.tuning;
        let values = [t.rest_penalty_factor, t.inversion_penalty_factor, t.replacement_tolerance, t.insertion_penalty];
        if values.iter().any(|v| !(*v >= 0.0)) {
            return Err(AnalysisError::Config(format!("tuning values must be non-negative: {t:?}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{AnalyzerConfig, CostTuning, ScalingFunction};

    #[test]
    fn test_defaults_from_empty_file() {
        let config = AnalyzerConfig::from_toml_str("").unwrap();
        assert_eq!(config, AnalyzerConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let config = AnalyzerConfig::from_toml_str(
            "sensitivity = 0.5\nmin-match = 6\nscaling = \"floored-sqrt\"\n\n[tuning]\nreplacement-tolerance = 1.0\n",
        )
        .unwrap();
        assert_eq!(config.sensitivity, 0.5);
        assert_eq!(config.min_match, 6);
        assert_eq!(config.padding_factor, 2);
        assert_eq!(config.scaling, ScalingFunction::FlooredSqrt);
        assert_eq!(config.tuning.replacement_tolerance, 1.0);
        assert_eq!(config.tuning.rest_penalty_factor, CostTuning::default().rest_penalty_factor);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(AnalyzerConfig::from_toml_str("sensitivity = -1.0").is_err());
        assert!(AnalyzerConfig::from_toml_str("min-match = 0").is_err());
        assert!(AnalyzerConfig::from_toml_str("[tuning]\ninsertion-penalty = -2.0").is_err());
        assert!(AnalyzerConfig::from_toml_str("sensitivity = \"high\"").is_err());
    }

    #[test]
    fn test_scaling() {
        assert_eq!(ScalingFunction::Sqrt.apply(9.0), 3.0);
        assert_eq!(ScalingFunction::FlooredSqrt.apply(8.0), 2.0);
        assert_eq!(ScalingFunction::Linear.apply(8.0), 8.0);
        assert_eq!(ScalingFunction::Sqrt.apply(f64::INFINITY), f64::INFINITY);
    }
}
