//! Market State Types
//!
//! The discrete state space of the market chain.
//!
//! # Example
//!
//! ```
//! use market_events::MarketState;
//!
//! let state: MarketState = "boom".parse().unwrap();
//! assert_eq!(state, MarketState::Boom);
//! assert_eq!(state.to_string(), "boom");
//! assert_eq!(state.index(), 3);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of market states.
pub const STATE_COUNT: usize = 5;

/// Market regime for a single tick.
///
/// Declaration order is the iteration and sampling order used everywhere.
/// Markets open flat unless configured otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketState {
    Up,
    Down,
    #[default]
    Flat,
    Boom,
    Crash,
}

impl MarketState {
    /// All states in declaration order.
    pub const ALL: [MarketState; STATE_COUNT] = [
        MarketState::Up,
        MarketState::Down,
        MarketState::Flat,
        MarketState::Boom,
        MarketState::Crash,
    ];

    /// Position of this state in [`MarketState::ALL`].
    pub fn index(self) -> usize {
        match self {
            MarketState::Up => 0,
            MarketState::Down => 1,
            MarketState::Flat => 2,
            MarketState::Boom => 3,
            MarketState::Crash => 4,
        }
    }

    /// Inverse of [`MarketState::index`].
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Return multiplier applied to invested value when the market lands here.
    pub fn multiplier(self) -> f64 {
        match self {
            MarketState::Up => 1.1,
            MarketState::Down => 0.9,
            MarketState::Flat => 1.0,
            MarketState::Boom => 1.3,
            MarketState::Crash => 0.6,
        }
    }

    /// Lowercase name used in configuration files and output.
    pub fn as_str(self) -> &'static str {
        match self {
            MarketState::Up => "up",
            MarketState::Down => "down",
            MarketState::Flat => "flat",
            MarketState::Boom => "boom",
            MarketState::Crash => "crash",
        }
    }

    /// True for states that lose value.
    pub fn is_bearish(self) -> bool {
        matches!(self, MarketState::Down | MarketState::Crash)
    }
}

impl fmt::Display for MarketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a state name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown market state: {0:?}")]
pub struct ParseStateError(pub String);

impl FromStr for MarketState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(MarketState::Up),
            "down" => Ok(MarketState::Down),
            "flat" => Ok(MarketState::Flat),
            "boom" => Ok(MarketState::Boom),
            "crash" => Ok(MarketState::Crash),
            _ => Err(ParseStateError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for state in MarketState::ALL {
            assert_eq!(MarketState::from_index(state.index()), Some(state));
        }
        assert_eq!(MarketState::from_index(STATE_COUNT), None);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("CRASH".parse::<MarketState>().unwrap(), MarketState::Crash);
        assert_eq!(" flat ".parse::<MarketState>().unwrap(), MarketState::Flat);
        assert!("sideways".parse::<MarketState>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&MarketState::Boom).unwrap();
        assert_eq!(json, "\"boom\"");
        let back: MarketState = serde_json::from_str("\"down\"").unwrap();
        assert_eq!(back, MarketState::Down);
    }

    #[test]
    fn test_multipliers() {
        assert!(MarketState::Boom.multiplier() > MarketState::Up.multiplier());
        assert_eq!(MarketState::Flat.multiplier(), 1.0);
        assert!(MarketState::Crash.multiplier() < MarketState::Down.multiplier());
        assert!(MarketState::Crash.is_bearish());
        assert!(!MarketState::Boom.is_bearish());
    }
}
