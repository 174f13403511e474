//! Decision Policies
//!
//! Pure functions mapping (personality, market state, random draw) to a
//! stay/exit decision, plus the re-entry rule for investors already out of
//! the market. Nothing here holds state or touches a generator; callers pass
//! the draw in, so a fixed draw sequence replays exactly.

use serde::{Deserialize, Serialize};

use market_events::{MarketState, Personality, STATE_COUNT};

use crate::config::ConfigError;

/// Stay probabilities per personality.
///
/// Rows follow [`Personality::ALL`], columns follow [`MarketState::ALL`]
/// (up, down, flat, boom, crash).
pub const STAY_TABLE: [[f64; STATE_COUNT]; 4] = [
    // cautious: stays through good markets, bails on losses
    [0.95, 0.40, 0.60, 0.85, 0.25],
    // greedy: rides booms and hangs on into crashes
    [0.99, 0.65, 0.70, 0.99, 0.55],
    // average
    [0.85, 0.50, 0.65, 0.80, 0.40],
    // risk-taking: flattest curve
    [0.90, 0.75, 0.80, 0.88, 0.70],
];

fn personality_row(personality: Personality) -> &'static [f64; STATE_COUNT] {
    match personality {
        Personality::Cautious => &STAY_TABLE[0],
        Personality::Greedy => &STAY_TABLE[1],
        Personality::Average => &STAY_TABLE[2],
        Personality::RiskTaking => &STAY_TABLE[3],
    }
}

/// Stateless stay/exit policy for investors currently in the market.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonalityPolicy;

impl PersonalityPolicy {
    /// Probability that an investor with `personality` stays in during `state`.
    pub fn stay_probability(personality: Personality, state: MarketState) -> f64 {
        personality_row(personality)[state.index()]
    }

    /// Returns true to stay, false to exit. `draw` must lie in [0, 1).
    pub fn decide(personality: Personality, state: MarketState, draw: f64) -> bool {
        draw < Self::stay_probability(personality, state)
    }

    /// Difference between the highest and lowest stay probability.
    pub fn sensitivity_spread(personality: Personality) -> f64 {
        let row = personality_row(personality);
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min = row.iter().cloned().fold(f64::INFINITY, f64::min);
        max - min
    }
}

/// Re-entry tuning for investors that are out of the market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReentryConfig {
    /// When false, an exit is permanent
    pub enabled: bool,
    /// Chance to rejoin regardless of price level
    pub base_chance: f64,
    /// Index level below which the market counts as deeply discounted
    pub deep_discount_below: f64,
    /// Bonus added when the index is deeply discounted
    pub deep_discount_bonus: f64,
    /// Index level below which the market counts as discounted
    pub discount_below: f64,
    /// Bonus added when the index is discounted but not deeply
    pub discount_bonus: f64,
}

impl Default for ReentryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_chance: 0.25,
            deep_discount_below: 0.8,
            deep_discount_bonus: 0.25,
            discount_below: 1.0,
            discount_bonus: 0.1,
        }
    }
}

impl ReentryConfig {
    /// A configuration where nobody ever comes back.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("reentry.base_chance", self.base_chance),
            ("reentry.deep_discount_bonus", self.deep_discount_bonus),
            ("reentry.discount_bonus", self.discount_bonus),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { field, value });
            }
        }
        for (field, value) in [
            ("reentry.deep_discount_below", self.deep_discount_below),
            ("reentry.discount_below", self.discount_below),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Threshold { field, value });
            }
        }
        Ok(())
    }
}

/// Stateless rejoin rule driven by the market index committed before the tick.
#[derive(Debug, Clone)]
pub struct ReentryPolicy {
    config: ReentryConfig,
}

impl ReentryPolicy {
    pub fn new(config: ReentryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReentryConfig {
        &self.config
    }

    /// Probability that an out-of-market investor rejoins at `market_index`.
    pub fn rejoin_probability(&self, market_index: f64) -> f64 {
        if !self.config.enabled {
            return 0.0;
        }
        let mut chance = self.config.base_chance;
        if market_index < self.config.deep_discount_below {
            chance += self.config.deep_discount_bonus;
        } else if market_index < self.config.discount_below {
            chance += self.config.discount_bonus;
        }
        chance.min(1.0)
    }

    /// Returns true to rejoin. `draw` must lie in [0, 1).
    pub fn decide(&self, market_index: f64, draw: f64) -> bool {
        draw < self.rejoin_probability(market_index)
    }
}

impl Default for ReentryPolicy {
    fn default() -> Self {
        Self::new(ReentryConfig::default())
    }
}
