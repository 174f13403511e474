//! Participation Types
//!
//! Per-investor decisions and the per-tick aggregate derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque investor identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvestorId(pub Uuid);

impl InvestorId {
    /// Builds an id from 16 random bytes so ids follow the simulation seed.
    pub fn from_random_bytes(bytes: [u8; 16]) -> Self {
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }
}

impl fmt::Display for InvestorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inv_{}", self.0.simple())
    }
}

/// Outcome of one investor's decision for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub investor_id: InvestorId,
    pub previous_in_market: bool,
    pub new_in_market: bool,
}

impl DecisionRecord {
    /// Investor was in the market and left this tick.
    pub fn exited(&self) -> bool {
        self.previous_in_market && !self.new_in_market
    }

    /// Investor was out of the market and rejoined this tick.
    pub fn rejoined(&self) -> bool {
        !self.previous_in_market && self.new_in_market
    }
}

/// Aggregate participation after all decisions of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticipationSummary {
    /// Investors in the market after this tick's decisions
    pub in_market: usize,
    /// Population size
    pub total: usize,
    /// `in_market / total`, or 0 for an empty population
    pub fraction: f64,
    /// Signed change of `fraction` relative to the previous tick
    pub change: f64,
}

impl ParticipationSummary {
    /// Computes the summary given the previous tick's fraction.
    pub fn new(in_market: usize, total: usize, previous_fraction: f64) -> Self {
        let fraction = if total == 0 {
            0.0
        } else {
            in_market as f64 / total as f64
        };
        let change = if total == 0 {
            0.0
        } else {
            fraction - previous_fraction
        };
        Self {
            in_market,
            total,
            fraction,
            change,
        }
    }

    /// Aggregates a tick's decisions.
    pub fn from_decisions(decisions: &[DecisionRecord], previous_fraction: f64) -> Self {
        let in_market = decisions.iter().filter(|d| d.new_in_market).count();
        Self::new(in_market, decisions.len(), previous_fraction)
    }

    /// True when there are no investors, so participation cannot move the market.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn out_of_market(&self) -> usize {
        self.total - self.in_market
    }
}
