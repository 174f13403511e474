//! Shared data types for the Markov market simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency for all other crates in the workspace.

pub mod history;
pub mod matrix;
pub mod participation;
pub mod personality;
pub mod state;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

// Re-export state types
pub use state::{MarketState, ParseStateError, STATE_COUNT};

// Re-export personality types
pub use personality::{ParsePersonalityError, Personality};

// Re-export matrix types
pub use matrix::{InvalidMatrixError, RawMatrix, Row, TransitionMatrix, ROW_SUM_TOLERANCE};

// Re-export participation types
pub use participation::{DecisionRecord, InvestorId, ParticipationSummary};

// Re-export history types
pub use history::{SimulationHistory, TickRecord};
