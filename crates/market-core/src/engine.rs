//! Simulation Engine
//!
//! Orchestrates the tick loop and owns every piece of mutable run state: the
//! generator, the chain, the base matrix and the population.
//!
//! Lifecycle: `Uninitialized -> Ready -> Running -> Completed`, or `Failed`
//! when a tick produces an invalid matrix.
//!
//! Each tick runs these phases in order:
//! 1. every investor decides against the pre-tick state
//! 2. the participation summary is computed from all decisions
//! 3. the feedback adjuster derives this tick's matrix
//! 4. the chain advances with that matrix
//! 5. the record is appended to history
//!
//! No phase starts before the previous one has finished for the whole
//! population.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use market_events::{
    DecisionRecord, InvalidMatrixError, MarketState, ParticipationSummary, SimulationHistory,
    TickRecord, TransitionMatrix,
};

use crate::chain::MarketChain;
use crate::config::{ConfigError, SimulationConfig};
use crate::feedback::FeedbackAdjuster;
use crate::investor::Investor;
use crate::policy::ReentryPolicy;
use crate::population::{spawn_population, summarize_population};

/// Lifecycle of a [`SimulationEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Uninitialized,
    Ready,
    Running,
    Completed,
    Failed,
}

/// What happens to each tick's adjusted matrix once the tick is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixDrift {
    /// The base matrix never changes; adjustments are discarded after use
    #[default]
    Fixed,
    /// Each adjusted matrix becomes the base matrix for the next tick
    Accumulate,
}

/// An operation was requested in the wrong lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {operation} while the engine is {actual:?}")]
pub struct EngineStateError {
    pub operation: &'static str,
    pub actual: EngineState,
}

/// Errors that stop a run.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid transition matrix at tick {tick}: {source}")]
    Matrix {
        tick: u64,
        #[source]
        source: InvalidMatrixError,
    },
    #[error(transparent)]
    State(#[from] EngineStateError),
}

/// Owns the run and drives the tick loop.
#[derive(Debug)]
pub struct SimulationEngine {
    state: EngineState,
    config: SimulationConfig,
    rng: SmallRng,
    chain: MarketChain,
    base_matrix: TransitionMatrix,
    adjuster: FeedbackAdjuster,
    reentry: ReentryPolicy,
    investors: Vec<Investor>,
    market_index: f64,
    previous_fraction: f64,
    history: SimulationHistory,
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationEngine {
    /// Creates an engine with nothing configured.
    pub fn new() -> Self {
        let config = SimulationConfig::default();
        Self {
            state: EngineState::Uninitialized,
            rng: SmallRng::seed_from_u64(config.random_seed),
            chain: MarketChain::new(config.initial_state),
            base_matrix: config.base_matrix.clone(),
            adjuster: FeedbackAdjuster::new(config.feedback.clone()),
            reentry: ReentryPolicy::new(config.reentry.clone()),
            investors: Vec::new(),
            market_index: config.initial_market_index,
            previous_fraction: 0.0,
            history: SimulationHistory::default(),
            config,
        }
    }

    /// Creates an engine and moves it to `Ready`.
    pub fn from_config(config: SimulationConfig) -> Result<Self, SimulationError> {
        let mut engine = Self::new();
        engine.initialize(config)?;
        Ok(engine)
    }

    /// Validates `config`, seeds the generator and spawns the population.
    ///
    /// On a configuration error the engine stays `Uninitialized`.
    pub fn initialize(&mut self, config: SimulationConfig) -> Result<(), SimulationError> {
        self.expect_state(EngineState::Uninitialized, "initialize")?;
        config.validate()?;

        let mut rng = SmallRng::seed_from_u64(config.random_seed);
        let investors =
            spawn_population(config.num_investors, &config.personality_mix, &mut rng)?;

        let population = summarize_population(&investors);
        tracing::info!(
            seed = config.random_seed,
            investors = population.total,
            ticks = config.num_ticks,
            initial_state = %config.initial_state,
            "simulation ready"
        );
        for (personality, count) in &population.by_personality {
            tracing::debug!(%personality, count, "spawned investors");
        }

        self.rng = rng;
        self.chain = MarketChain::new(config.initial_state);
        self.base_matrix = config.base_matrix.clone();
        self.adjuster = FeedbackAdjuster::new(config.feedback.clone());
        self.reentry = ReentryPolicy::new(config.reentry.clone());
        self.previous_fraction = if investors.is_empty() { 0.0 } else { 1.0 };
        self.investors = investors;
        self.market_index = config.initial_market_index;
        self.history = SimulationHistory::new(
            config.random_seed,
            config.initial_state,
            config.initial_market_index,
        );
        self.config = config;
        self.state = EngineState::Ready;
        Ok(())
    }

    /// Runs `steps` ticks and completes the run.
    pub fn run(&mut self, steps: u64) -> Result<&SimulationHistory, SimulationError> {
        self.run_until(steps, |_| true)
    }

    /// Runs up to `steps` ticks, stopping early after any committed tick for
    /// which `keep_going` returns false. Either way the run completes.
    pub fn run_until<F>(
        &mut self,
        steps: u64,
        mut keep_going: F,
    ) -> Result<&SimulationHistory, SimulationError>
    where
        F: FnMut(&TickRecord) -> bool,
    {
        self.expect_state(EngineState::Ready, "run")?;
        self.state = EngineState::Running;

        for tick in 0..steps {
            let record = match self.tick(tick) {
                Ok(record) => record,
                Err(e) => {
                    self.state = EngineState::Failed;
                    tracing::error!(tick, error = %e, "simulation failed");
                    return Err(e);
                }
            };

            self.history.push(record);
            let committed = self.history.last().map(|r| keep_going(r)).unwrap_or(true);
            if !committed {
                tracing::info!(tick, "simulation stopped by caller");
                break;
            }
        }

        self.state = EngineState::Completed;
        tracing::info!(
            ticks = self.history.len(),
            final_state = %self.chain.current(),
            market_index = self.market_index,
            "simulation complete"
        );
        Ok(&self.history)
    }

    /// One full tick; nothing is committed to history here.
    fn tick(&mut self, tick: u64) -> Result<TickRecord, SimulationError> {
        let previous_state = self.chain.current();

        // Phase 1: decisions see only the pre-tick state and index
        let decisions = self.decide_all(previous_state);

        // Phase 2
        let participation =
            ParticipationSummary::from_decisions(&decisions, self.previous_fraction);

        // Phase 3
        let adjusted = self
            .adjuster
            .adjust(&self.base_matrix, &participation)
            .map_err(|source| SimulationError::Matrix { tick, source })?;

        // Phase 4
        let new_state = self
            .chain
            .advance(&adjusted, &mut self.rng)
            .map_err(|source| SimulationError::Matrix { tick, source })?;

        self.market_index *= new_state.multiplier();
        self.previous_fraction = participation.fraction;

        tracing::debug!(
            tick,
            from = %previous_state,
            to = %new_state,
            participation = participation.fraction,
            change = participation.change,
            market_index = self.market_index,
            "tick committed"
        );

        if self.config.drift == MatrixDrift::Accumulate {
            self.base_matrix = adjusted.clone();
        }

        Ok(TickRecord {
            tick,
            previous_state,
            new_state,
            participation,
            matrix: adjusted,
            market_index: self.market_index,
            decisions: if self.config.record_decisions {
                decisions
            } else {
                Vec::new()
            },
        })
    }

    /// Every investor decides once, in population order.
    fn decide_all(&mut self, state: MarketState) -> Vec<DecisionRecord> {
        let market_index = self.market_index;
        let reentry = &self.reentry;
        let rng = &mut self.rng;
        self.investors
            .iter_mut()
            .map(|investor| investor.decide(state, market_index, reentry, rng))
            .collect()
    }

    fn expect_state(
        &self,
        expected: EngineState,
        operation: &'static str,
    ) -> Result<(), EngineStateError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(EngineStateError {
                operation,
                actual: self.state,
            })
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn history(&self) -> &SimulationHistory {
        &self.history
    }

    /// Consumes a completed engine and returns its history.
    pub fn into_history(self) -> Result<SimulationHistory, EngineStateError> {
        self.expect_state(EngineState::Completed, "take the history")?;
        Ok(self.history)
    }

    pub fn investors(&self) -> &[Investor] {
        &self.investors
    }

    pub fn current_state(&self) -> MarketState {
        self.chain.current()
    }

    /// Base matrix the next tick will adjust.
    pub fn base_matrix(&self) -> &TransitionMatrix {
        &self.base_matrix
    }

    pub fn market_index(&self) -> f64 {
        self.market_index
    }
}
