//! Sample data fixtures for testing.
//!
//! Ready-made matrices and histories for other crates' tests.
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // market-events = { path = "../market-events", features = ["test-fixtures"] }
//!
//! use market_events::fixtures;
//!
//! let history = fixtures::sample_history();
//! let matrix = fixtures::up_bucket_matrix();
//! ```

use crate::{MarketState, SimulationHistory, TransitionMatrix, STATE_COUNT};

/// Returns a three-tick, three-investor history from the fixtures file.
///
/// - tick 0: flat -> up, one investor exits
/// - tick 1: up -> boom, a second investor exits
/// - tick 2: boom -> crash, the second investor rejoins
pub fn sample_history() -> SimulationHistory {
    let json = include_str!("../tests/fixtures/sample_history.json");
    SimulationHistory::from_json(json).expect("Failed to parse sample_history.json")
}

/// Default matrix with the `up` row replaced by {up 0.5, down 0.3, flat 0.2}.
pub fn up_bucket_matrix() -> TransitionMatrix {
    TransitionMatrix::default()
        .with_row(MarketState::Up, [0.5, 0.3, 0.2, 0.0, 0.0])
        .expect("up bucket row is a distribution")
}

/// Matrix that keeps the market in `crash` forever.
pub fn crash_forever() -> TransitionMatrix {
    TransitionMatrix::absorbing(MarketState::Crash)
}

/// Default matrix with the `from` row emptied, bypassing validation.
pub fn massless_row(from: MarketState) -> TransitionMatrix {
    let mut rows = *TransitionMatrix::default().rows();
    rows[from.index()] = [0.0; STATE_COUNT];
    TransitionMatrix::from_rows_unchecked(rows)
}
