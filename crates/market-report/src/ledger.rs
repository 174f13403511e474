//! Portfolio Ledger
//!
//! Reconstructs every investor's portfolio value from a recorded history.
//! Each investor starts with the same value; after a tick, investors that are
//! in the market (after their decision) have their value multiplied by the
//! new state's return multiplier.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use market_events::{InvestorId, MarketState, SimulationHistory, TickRecord};

/// Starting portfolio value for every investor.
pub const DEFAULT_INITIAL_VALUE: f64 = 1000.0;

/// One investor's portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub investor_id: InvestorId,
    pub value: f64,
    pub in_market: bool,
}

/// Total value held by in-market investors after a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuePoint {
    pub tick: u64,
    pub state: MarketState,
    pub market_index: f64,
    pub total_active_value: f64,
}

/// Errors raised while replaying a history.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("tick {tick} has {total} investors but no recorded decisions")]
    MissingDecisions { tick: u64, total: usize },
    #[error("tick {tick} has a decision for unknown investor {investor_id}")]
    UnknownInvestor { tick: u64, investor_id: InvestorId },
    #[error("tick {tick} records {found} decisions, expected {expected}")]
    PopulationChanged {
        tick: u64,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone)]
pub struct PortfolioLedger {
    initial_value: f64,
    holdings: Vec<Holding>,
    index: HashMap<InvestorId, usize>,
    series: Vec<ValuePoint>,
}

impl Default for PortfolioLedger {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_VALUE)
    }
}

impl PortfolioLedger {
    pub fn new(initial_value: f64) -> Self {
        Self {
            initial_value,
            holdings: Vec::new(),
            index: HashMap::new(),
            series: Vec::new(),
        }
    }

    /// Replays a whole history.
    pub fn replay(history: &SimulationHistory, initial_value: f64) -> Result<Self, LedgerError> {
        let mut ledger = Self::new(initial_value);
        for record in history {
            ledger.apply(record)?;
        }
        Ok(ledger)
    }

    /// Applies one tick. The population is taken from the first record.
    pub fn apply(&mut self, record: &TickRecord) -> Result<(), LedgerError> {
        if record.decisions.is_empty() && record.participation.total > 0 {
            return Err(LedgerError::MissingDecisions {
                tick: record.tick,
                total: record.participation.total,
            });
        }

        if self.series.is_empty() && self.holdings.is_empty() {
            for decision in &record.decisions {
                self.index.insert(decision.investor_id, self.holdings.len());
                self.holdings.push(Holding {
                    investor_id: decision.investor_id,
                    value: self.initial_value,
                    in_market: decision.previous_in_market,
                });
            }
        } else if record.decisions.len() != self.holdings.len() {
            return Err(LedgerError::PopulationChanged {
                tick: record.tick,
                expected: self.holdings.len(),
                found: record.decisions.len(),
            });
        }

        let multiplier = record.new_state.multiplier();
        for decision in &record.decisions {
            let slot = *self.index.get(&decision.investor_id).ok_or(
                LedgerError::UnknownInvestor {
                    tick: record.tick,
                    investor_id: decision.investor_id,
                },
            )?;
            let holding = &mut self.holdings[slot];
            holding.in_market = decision.new_in_market;
            if holding.in_market {
                holding.value *= multiplier;
            }
        }

        self.series.push(ValuePoint {
            tick: record.tick,
            state: record.new_state,
            market_index: record.market_index,
            total_active_value: self.total_active_value(),
        });
        Ok(())
    }

    pub fn initial_value(&self) -> f64 {
        self.initial_value
    }

    /// Holdings in population order.
    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn holding(&self, id: &InvestorId) -> Option<&Holding> {
        self.index.get(id).map(|&slot| &self.holdings[slot])
    }

    pub fn active_values(&self) -> Vec<f64> {
        self.values_where(true)
    }

    pub fn exited_values(&self) -> Vec<f64> {
        self.values_where(false)
    }

    fn values_where(&self, in_market: bool) -> Vec<f64> {
        self.holdings
            .iter()
            .filter(|h| h.in_market == in_market)
            .map(|h| h.value)
            .collect()
    }

    pub fn total_active_value(&self) -> f64 {
        self.holdings
            .iter()
            .filter(|h| h.in_market)
            .map(|h| h.value)
            .sum()
    }

    /// Total active value after every applied tick.
    pub fn value_series(&self) -> &[ValuePoint] {
        &self.series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_events::fixtures::sample_history;

    fn id(byte: u8) -> InvestorId {
        sample_history().records()[0]
            .decisions
            .iter()
            .map(|d| d.investor_id)
            .find(|i| i.0.as_bytes()[0] == byte)
            .unwrap()
    }

    #[test]
    fn test_replay_sample_history() {
        let ledger = PortfolioLedger::replay(&sample_history(), DEFAULT_INITIAL_VALUE).unwrap();
        assert_eq!(ledger.holdings().len(), 3);

        let a = ledger.holding(&id(1)).unwrap();
        assert!((a.value - 858.0).abs() < 1e-9);
        assert!(a.in_market);

        let b = ledger.holding(&id(2)).unwrap();
        assert!((b.value - 660.0).abs() < 1e-9);
        assert!(b.in_market);

        let c = ledger.holding(&id(3)).unwrap();
        assert_eq!(c.value, 1000.0);
        assert!(!c.in_market);
    }

    #[test]
    fn test_value_series() {
        let ledger = PortfolioLedger::replay(&sample_history(), DEFAULT_INITIAL_VALUE).unwrap();
        let totals: Vec<f64> = ledger
            .value_series()
            .iter()
            .map(|p| p.total_active_value)
            .collect();
        let expected = [2200.0, 1430.0, 1518.0];
        assert_eq!(totals.len(), 3);
        for (got, want) in totals.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-9, "{} vs {}", got, want);
        }
    }

    #[test]
    fn test_missing_decisions_rejected() {
        let mut history = sample_history();
        let mut stripped = SimulationHistory::new(history.seed, history.initial_state, 1.0);
        for record in history.records().iter().cloned() {
            stripped.push(TickRecord {
                decisions: Vec::new(),
                ..record
            });
        }
        history = stripped;

        let err = PortfolioLedger::replay(&history, DEFAULT_INITIAL_VALUE).unwrap_err();
        assert_eq!(err, LedgerError::MissingDecisions { tick: 0, total: 3 });
    }

    #[test]
    fn test_empty_population() {
        let mut history = SimulationHistory::new(1, MarketState::Flat, 1.0);
        let mut record = sample_history().records()[0].clone();
        record.decisions.clear();
        record.participation = market_events::ParticipationSummary::new(0, 0, 0.0);
        history.push(record);

        let ledger = PortfolioLedger::replay(&history, DEFAULT_INITIAL_VALUE).unwrap();
        assert!(ledger.holdings().is_empty());
        assert_eq!(ledger.value_series()[0].total_active_value, 0.0);
    }
}
