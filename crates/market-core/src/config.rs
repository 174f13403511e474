//! Configuration System
//!
//! Run configuration, loadable from a TOML file. Every section falls back to
//! its defaults, so a file only needs the values it changes.
//!
//! ```toml
//! num_investors = 500
//! num_ticks = 20
//! random_seed = 7
//!
//! [personality_mix]
//! cautious = 0.4
//! greedy = 0.2
//! average = 0.2
//! risk_taking = 0.2
//!
//! [feedback]
//! sensitivity = 0.8
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use market_events::{InvalidMatrixError, MarketState, Personality, TransitionMatrix};

use crate::engine::MatrixDrift;
use crate::feedback::FeedbackConfig;
use crate::policy::ReentryConfig;
use crate::population::PersonalityMix;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "market.toml";

/// Largest supported population.
pub const MAX_INVESTORS: usize = 1_000_000;

/// Complete run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Population size; zero runs the chain without participation effects
    pub num_investors: usize,
    /// Ticks to simulate
    pub num_ticks: u64,
    /// Seed for the single generator threaded through the run
    pub random_seed: u64,
    /// Market state before the first tick
    pub initial_state: MarketState,
    /// Market index before the first tick
    pub initial_market_index: f64,
    /// Whether adjusted matrices are folded back into the base matrix
    pub drift: MatrixDrift,
    /// Keep per-investor decisions in every tick record
    pub record_decisions: bool,
    pub base_matrix: TransitionMatrix,
    pub personality_mix: PersonalityMix,
    pub feedback: FeedbackConfig,
    pub reentry: ReentryConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_investors: 100,
            num_ticks: 20,
            random_seed: 42,
            initial_state: MarketState::Flat,
            initial_market_index: 1.0,
            drift: MatrixDrift::Fixed,
            record_decisions: true,
            base_matrix: TransitionMatrix::default(),
            personality_mix: PersonalityMix::default(),
            feedback: FeedbackConfig::default(),
            reentry: ReentryConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks every option; called before any investor is created.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_investors > MAX_INVESTORS {
            return Err(ConfigError::TooManyInvestors {
                requested: self.num_investors,
                max: MAX_INVESTORS,
            });
        }
        if self.num_ticks == 0 {
            return Err(ConfigError::ZeroTicks);
        }
        if !self.initial_market_index.is_finite() || self.initial_market_index <= 0.0 {
            return Err(ConfigError::MarketIndex(self.initial_market_index));
        }
        self.base_matrix.validate()?;
        self.personality_mix.validate()?;
        self.feedback.validate()?;
        self.reentry.validate()?;
        Ok(())
    }
}

/// Returns the default configuration as a TOML string.
pub fn default_config_toml() -> Result<String, ConfigError> {
    SimulationConfig::default().to_toml()
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("population of {requested} investors exceeds the maximum of {max}")]
    TooManyInvestors { requested: usize, max: usize },
    #[error("num_ticks must be greater than zero")]
    ZeroTicks,
    #[error("initial market index must be finite and positive, got {0}")]
    MarketIndex(f64),
    #[error("personality mix fractions sum to {sum}, expected 1")]
    MixSum { sum: f64 },
    #[error("personality mix fraction for {personality} is {value}, expected a value in [0, 1]")]
    MixFraction { personality: Personality, value: f64 },
    #[error("feedback sensitivity must be finite and non-negative, got {0}")]
    Sensitivity(f64),
    #[error("{field} must be in [0, 1], got {value}")]
    Probability { field: &'static str, value: f64 },
    #[error("{field} must be finite, got {value}")]
    Threshold { field: &'static str, value: f64 },
    #[error("malformed base matrix: {0}")]
    Matrix(#[from] InvalidMatrixError),
}
