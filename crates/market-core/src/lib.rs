//! Markov market simulation core.
//!
//! A market moves between five states (up, down, flat, boom, crash) according
//! to a transition matrix. A population of investors decides every tick
//! whether to stay in the market, and the share that stays reshapes the
//! matrix for the next transition.
//!
//! # Architecture
//!
//! ```text
//! investors ──decisions──▶ participation ──▶ feedback ──matrix──▶ chain
//!     ▲                                                              │
//!     └──────────────────────── new state ◀─────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`policy`]: Per-personality stay probabilities and the re-entry rule
//! - [`investor`]: Investor state and its per-tick decision
//! - [`population`]: Seeded population spawning from a personality mix
//! - [`feedback`]: Participation-driven matrix adjustment
//! - [`chain`]: The Markov chain and row sampling
//! - [`engine`]: Tick loop and run lifecycle
//! - [`config`]: TOML configuration and validation

pub mod chain;
pub mod config;
pub mod engine;
pub mod feedback;
pub mod investor;
pub mod policy;
pub mod population;

// Re-export engine types
pub use engine::{EngineState, EngineStateError, MatrixDrift, SimulationEngine, SimulationError};

// Re-export config types
pub use config::{
    default_config_toml, ConfigError, SimulationConfig, DEFAULT_CONFIG_PATH, MAX_INVESTORS,
};

// Re-export model types
pub use chain::{sample_next, MarketChain};
pub use feedback::{FeedbackAdjuster, FeedbackConfig, LowParticipationPenalty, FEEDBACK_BIAS};
pub use investor::Investor;
pub use policy::{PersonalityPolicy, ReentryConfig, ReentryPolicy, STAY_TABLE};
pub use population::{
    generate_investor_id, spawn_population, summarize_population, PersonalityMix,
    PopulationSummary,
};

use market_events::SimulationHistory;

/// Runs a whole simulation from `config` and returns its history.
///
/// Configuration errors are reported before any investor is created.
pub fn run_simulation(config: &SimulationConfig) -> Result<SimulationHistory, SimulationError> {
    let mut engine = SimulationEngine::from_config(config.clone())?;
    engine.run(config.num_ticks)?;
    Ok(engine.into_history()?)
}
