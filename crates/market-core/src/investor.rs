//! Investors
//!
//! An investor owns its identity, a fixed personality and its in/out flag.
//! Each tick it takes exactly one draw from the shared generator and updates
//! only its own flag.

use rand::Rng;
use serde::{Deserialize, Serialize};

use market_events::{DecisionRecord, InvestorId, MarketState, Personality};

use crate::policy::{PersonalityPolicy, ReentryPolicy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investor {
    id: InvestorId,
    personality: Personality,
    in_market: bool,
}

impl Investor {
    /// New investors start in the market.
    pub fn new(id: InvestorId, personality: Personality) -> Self {
        Self {
            id,
            personality,
            in_market: true,
        }
    }

    pub fn id(&self) -> InvestorId {
        self.id
    }

    pub fn personality(&self) -> Personality {
        self.personality
    }

    pub fn in_market(&self) -> bool {
        self.in_market
    }

    /// Decides for this tick using one draw from `rng`.
    ///
    /// `state` is the pre-tick market state; `market_index` is the index
    /// committed before the tick and only matters for re-entry.
    pub fn decide<R: Rng + ?Sized>(
        &mut self,
        state: MarketState,
        market_index: f64,
        reentry: &ReentryPolicy,
        rng: &mut R,
    ) -> DecisionRecord {
        let draw: f64 = rng.gen();
        self.decide_with_draw(state, market_index, reentry, draw)
    }

    /// Same as [`Investor::decide`] with the draw supplied by the caller.
    pub fn decide_with_draw(
        &mut self,
        state: MarketState,
        market_index: f64,
        reentry: &ReentryPolicy,
        draw: f64,
    ) -> DecisionRecord {
        let previous_in_market = self.in_market;
        self.in_market = if previous_in_market {
            PersonalityPolicy::decide(self.personality, state, draw)
        } else {
            reentry.decide(market_index, draw)
        };

        DecisionRecord {
            investor_id: self.id,
            previous_in_market,
            new_in_market: self.in_market,
        }
    }
}
