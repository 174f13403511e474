//! Population Setup
//!
//! Builds the investor population from a personality mix using the run's
//! seeded generator, so ids and personalities follow the seed.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use market_events::{InvestorId, Personality};

use crate::config::ConfigError;
use crate::investor::Investor;

/// Tolerance when checking that mix fractions sum to 1.
pub const MIX_TOLERANCE: f64 = 1e-6;

/// Share of each personality in the population.
///
/// A personality left out of a configured mix gets no investors; the even
/// split from [`Default`] only applies when no mix is configured at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonalityMix {
    #[serde(default)]
    pub cautious: f64,
    #[serde(default)]
    pub greedy: f64,
    #[serde(default)]
    pub average: f64,
    #[serde(default, alias = "risk-taking", alias = "risk_taker")]
    pub risk_taking: f64,
}

impl Default for PersonalityMix {
    fn default() -> Self {
        Self {
            cautious: 0.25,
            greedy: 0.25,
            average: 0.25,
            risk_taking: 0.25,
        }
    }
}

impl PersonalityMix {
    /// A population made of a single personality.
    pub fn only(personality: Personality) -> Self {
        let mut mix = Self {
            cautious: 0.0,
            greedy: 0.0,
            average: 0.0,
            risk_taking: 0.0,
        };
        *mix.fraction_mut(personality) = 1.0;
        mix
    }

    pub fn fraction(&self, personality: Personality) -> f64 {
        match personality {
            Personality::Cautious => self.cautious,
            Personality::Greedy => self.greedy,
            Personality::Average => self.average,
            Personality::RiskTaking => self.risk_taking,
        }
    }

    fn fraction_mut(&mut self, personality: Personality) -> &mut f64 {
        match personality {
            Personality::Cautious => &mut self.cautious,
            Personality::Greedy => &mut self.greedy,
            Personality::Average => &mut self.average,
            Personality::RiskTaking => &mut self.risk_taking,
        }
    }

    /// Fractions in [`Personality::ALL`] order.
    pub fn weights(&self) -> [f64; 4] {
        Personality::ALL.map(|p| self.fraction(p))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for personality in Personality::ALL {
            let value = self.fraction(personality);
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::MixFraction { personality, value });
            }
        }
        let sum: f64 = self.weights().iter().sum();
        if (sum - 1.0).abs() > MIX_TOLERANCE {
            return Err(ConfigError::MixSum { sum });
        }
        Ok(())
    }
}

/// Generates an investor id from the run's generator.
pub fn generate_investor_id<R: Rng + ?Sized>(rng: &mut R) -> InvestorId {
    InvestorId::from_random_bytes(rng.gen())
}

/// Spawns `count` investors, sampling each personality from `mix`.
pub fn spawn_population<R: Rng + ?Sized>(
    count: usize,
    mix: &PersonalityMix,
    rng: &mut R,
) -> Result<Vec<Investor>, ConfigError> {
    mix.validate()?;
    if count == 0 {
        return Ok(Vec::new());
    }

    let dist = WeightedIndex::new(mix.weights()).map_err(|_| ConfigError::MixSum {
        sum: mix.weights().iter().sum(),
    })?;

    let mut investors = Vec::with_capacity(count);
    for _ in 0..count {
        let personality = Personality::ALL[dist.sample(rng)];
        let id = generate_investor_id(rng);
        investors.push(Investor::new(id, personality));
    }
    Ok(investors)
}

/// Head count per personality.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PopulationSummary {
    pub total: usize,
    pub in_market: usize,
    pub by_personality: Vec<(Personality, usize)>,
}

impl PopulationSummary {
    pub fn count(&self, personality: Personality) -> usize {
        self.by_personality
            .iter()
            .find(|(p, _)| *p == personality)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

/// Summarizes a population for logging and reports.
pub fn summarize_population(investors: &[Investor]) -> PopulationSummary {
    let by_personality = Personality::ALL
        .iter()
        .map(|p| {
            let n = investors.iter().filter(|i| i.personality() == *p).count();
            (*p, n)
        })
        .collect();

    PopulationSummary {
        total: investors.len(),
        in_market: investors.iter().filter(|i| i.in_market()).count(),
        by_personality,
    }
}
