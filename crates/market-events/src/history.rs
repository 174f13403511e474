//! Simulation History
//!
//! Append-only record of every committed tick. Consumers (reports, plotting)
//! only ever read it.

use serde::{Deserialize, Serialize};

use crate::matrix::TransitionMatrix;
use crate::participation::{DecisionRecord, ParticipationSummary};
use crate::state::MarketState;

/// Everything that happened in one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    /// Zero-based tick index
    pub tick: u64,
    /// State the investors saw when deciding
    pub previous_state: MarketState,
    /// State sampled at the end of the tick
    pub new_state: MarketState,
    pub participation: ParticipationSummary,
    /// Matrix the chain sampled from this tick
    pub matrix: TransitionMatrix,
    /// Market index after applying `new_state`'s multiplier
    pub market_index: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decisions: Vec<DecisionRecord>,
}

impl TickRecord {
    /// Serializes the record as a single JSON line.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes a record from a JSON line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Number of investors that left the market this tick.
    pub fn exits(&self) -> usize {
        self.decisions.iter().filter(|d| d.exited()).count()
    }

    /// Number of investors that rejoined the market this tick.
    pub fn rejoins(&self) -> usize {
        self.decisions.iter().filter(|d| d.rejoined()).count()
    }
}

/// Ordered tick records for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationHistory {
    /// Seed the run was started with
    pub seed: u64,
    /// State before the first tick
    pub initial_state: MarketState,
    /// Market index before the first tick
    pub initial_market_index: f64,
    records: Vec<TickRecord>,
}

impl SimulationHistory {
    pub fn new(seed: u64, initial_state: MarketState, initial_market_index: f64) -> Self {
        Self {
            seed,
            initial_state,
            initial_market_index,
            records: Vec::new(),
        }
    }

    /// Appends a committed tick.
    pub fn push(&mut self, record: TickRecord) {
        debug_assert_eq!(record.tick, self.records.len() as u64);
        self.records.push(record);
    }

    pub fn records(&self) -> &[TickRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, tick: u64) -> Option<&TickRecord> {
        self.records.get(tick as usize)
    }

    pub fn last(&self) -> Option<&TickRecord> {
        self.records.last()
    }

    /// State after the last committed tick.
    pub fn current_state(&self) -> MarketState {
        self.last()
            .map(|r| r.new_state)
            .unwrap_or(self.initial_state)
    }

    /// Market state sequence, one entry per tick.
    pub fn states(&self) -> Vec<MarketState> {
        self.records.iter().map(|r| r.new_state).collect()
    }

    /// Participation fraction per tick.
    pub fn participation_fractions(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.participation.fraction).collect()
    }

    /// Market index per tick.
    pub fn market_indices(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.market_index).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TickRecord> {
        self.records.iter()
    }

    /// Serializes the whole history as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

impl<'a> IntoIterator for &'a SimulationHistory {
    type Item = &'a TickRecord;
    type IntoIter = std::slice::Iter<'a, TickRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participation::InvestorId;

    fn record(tick: u64, previous: MarketState, new: MarketState) -> TickRecord {
        TickRecord {
            tick,
            previous_state: previous,
            new_state: new,
            participation: ParticipationSummary::new(1, 2, 1.0),
            matrix: TransitionMatrix::default(),
            market_index: new.multiplier(),
            decisions: vec![
                DecisionRecord {
                    investor_id: InvestorId::from_random_bytes([1; 16]),
                    previous_in_market: true,
                    new_in_market: true,
                },
                DecisionRecord {
                    investor_id: InvestorId::from_random_bytes([2; 16]),
                    previous_in_market: true,
                    new_in_market: false,
                },
            ],
        }
    }

    #[test]
    fn test_push_and_query() {
        let mut history = SimulationHistory::new(42, MarketState::Flat, 1.0);
        assert_eq!(history.current_state(), MarketState::Flat);

        history.push(record(0, MarketState::Flat, MarketState::Up));
        history.push(record(1, MarketState::Up, MarketState::Crash));

        assert_eq!(history.len(), 2);
        assert_eq!(history.current_state(), MarketState::Crash);
        assert_eq!(history.states(), vec![MarketState::Up, MarketState::Crash]);
        assert_eq!(history.participation_fractions(), vec![0.5, 0.5]);
        assert_eq!(history.get(1).unwrap().previous_state, MarketState::Up);
        assert!(history.get(2).is_none());
    }

    #[test]
    fn test_exit_counts() {
        let r = record(0, MarketState::Flat, MarketState::Down);
        assert_eq!(r.exits(), 1);
        assert_eq!(r.rejoins(), 0);
    }

    #[test]
    fn test_jsonl_line() {
        let r = record(0, MarketState::Boom, MarketState::Up);
        let line = r.to_jsonl().unwrap();
        assert!(!line.contains('\n'));
        let back = TickRecord::from_jsonl(&line).unwrap();
        assert_eq!(back, r);
    }
}
