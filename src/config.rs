use serde::{Deserialize, Serialize};

use crate::constants::{
    BASELINE_RATING, BASELINE_RD, BASELINE_VOLATILITY, DEFAULT_BATCH_SIZE, DEFAULT_ITERATIONS,
    ELO_K_FACTOR, GLICKO2_TAU, GLICKO2_TOLERANCE, MOV_SCALE,
};
use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EloConfig {
    pub initial_rating: f64,
    pub k_factor: f64,
    /// Multiplier on ln(|margin| + 1)
    pub mov_scale: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        EloConfig {
            initial_rating: BASELINE_RATING,
            k_factor: ELO_K_FACTOR,
            mov_scale: MOV_SCALE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Glicko2Config {
    pub initial_rating: f64,
    pub initial_rd: f64,
    pub initial_volatility: f64,
    /// System constant τ, only read by the iterative volatility policy
    pub tau: f64,
    pub convergence_tolerance: f64,
}

impl Default for Glicko2Config {
    fn default() -> Self {
        Glicko2Config {
            initial_rating: BASELINE_RATING,
            initial_rd: BASELINE_RD,
            initial_volatility: BASELINE_VOLATILITY,
            tau: GLICKO2_TAU,
            convergence_tolerance: GLICKO2_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub iterations: usize,
    /// Master seed; `None` draws one from the OS
    pub seed: Option<u64>,
    /// Iterations handed to each rayon task
    pub batch_size: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            iterations: DEFAULT_ITERATIONS,
            seed: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Every section defaults to the values in [`crate::constants`]:
///
/// ```toml
/// [elo]
/// k_factor = 24.0
///
/// [simulation]
/// iterations = 50000
/// seed = 7
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub elo: EloConfig,
    pub glicko2: Glicko2Config,
    pub simulation: SimulationConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("elo.k_factor", self.elo.k_factor),
            ("elo.mov_scale", self.elo.mov_scale),
            ("glicko2.initial_rd", self.glicko2.initial_rd),
            ("glicko2.initial_volatility", self.glicko2.initial_volatility),
            ("glicko2.tau", self.glicko2.tau),
            ("glicko2.convergence_tolerance", self.glicko2.convergence_tolerance),
        ];
        for (name, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(EngineError::Config(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if self.simulation.iterations == 0 {
            return Err(EngineError::Config("simulation.iterations must be at least 1".into()));
        }
        if self.simulation.batch_size == 0 {
            return Err(EngineError::Config("simulation.batch_size must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.elo.k_factor, 32.0);
        assert_eq!(config.glicko2.initial_rd, 350.0);
        assert_eq!(config.simulation.iterations, 10_000);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = EngineConfig::from_toml_str(
            "[elo]\nk_factor = 24.0\n\n[simulation]\niterations = 500\nseed = 7\n",
        )
        .unwrap();
        assert_eq!(config.elo.k_factor, 24.0);
        assert_eq!(config.elo.mov_scale, 0.8);
        assert_eq!(config.simulation.iterations, 500);
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.simulation.batch_size, 1_000);
    }

    #[test]
    fn test_rejects_non_positive_values() {
        let err = EngineConfig::from_toml_str("[glicko2]\ntau = 0.0\n").unwrap_err();
        assert!(matches!(err, EngineError::Config(msg) if msg.contains("glicko2.tau")));

        let err = EngineConfig::from_toml_str("[simulation]\niterations = 0\n").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(EngineConfig::from_toml_str("[elo\nk_factor = ").is_err());
    }
}
