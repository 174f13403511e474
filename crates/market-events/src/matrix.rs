//! Transition Matrix
//!
//! Row-stochastic table of next-state probabilities conditioned on the current
//! state. A `TransitionMatrix` can only be built through validating
//! constructors, so every value of the type satisfies the row-sum invariant.
//!
//! Serializes as a nested table keyed by state name:
//!
//! ```toml
//! [up]
//! up = 0.4
//! down = 0.3
//! flat = 0.25
//! crash = 0.025
//! boom = 0.025
//! ```
//!
//! Missing entries inside a row are treated as zero; a missing row is an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::state::{MarketState, ParseStateError, STATE_COUNT};

/// Allowed deviation of a row sum from 1.0.
pub const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// A single row, indexed by [`MarketState::index`].
pub type Row = [f64; STATE_COUNT];

/// Serialized form: source state name -> target state name -> probability.
pub type RawMatrix = BTreeMap<String, BTreeMap<String, f64>>;

/// A probability row or table that is not a valid distribution.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidMatrixError {
    #[error("row '{from}' sums to {sum}, expected 1 ± {}", ROW_SUM_TOLERANCE)]
    RowSum { from: MarketState, sum: f64 },
    #[error("entry '{from}' -> '{to}' is {value}, expected a probability in [0, 1]")]
    OutOfRange {
        from: MarketState,
        to: MarketState,
        value: f64,
    },
    #[error("row '{0}' is missing")]
    MissingRow(MarketState),
    #[error(transparent)]
    UnknownState(#[from] ParseStateError),
}

/// Validated row-stochastic matrix over [`MarketState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix", into = "RawMatrix")]
pub struct TransitionMatrix {
    rows: [Row; STATE_COUNT],
}

impl TransitionMatrix {
    /// Builds a matrix from rows in state declaration order.
    pub fn from_rows(rows: [Row; STATE_COUNT]) -> Result<Self, InvalidMatrixError> {
        let matrix = Self { rows };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Skips validation; only for building broken matrices in tests.
    #[cfg(any(test, feature = "test-fixtures"))]
    pub(crate) fn from_rows_unchecked(rows: [Row; STATE_COUNT]) -> Self {
        Self { rows }
    }

    /// Builds a matrix where every row sends all mass to a single state.
    pub fn absorbing(target: MarketState) -> Self {
        let mut row = [0.0; STATE_COUNT];
        row[target.index()] = 1.0;
        Self {
            rows: [row; STATE_COUNT],
        }
    }

    /// Builds a matrix where every transition is equally likely.
    pub fn uniform() -> Self {
        let p = 1.0 / STATE_COUNT as f64;
        Self {
            rows: [[p; STATE_COUNT]; STATE_COUNT],
        }
    }

    /// Returns a copy with one row replaced.
    pub fn with_row(&self, from: MarketState, row: Row) -> Result<Self, InvalidMatrixError> {
        let mut rows = self.rows;
        rows[from.index()] = row;
        Self::from_rows(rows)
    }

    /// Raw probabilities of the row for `from`.
    pub fn row(&self, from: MarketState) -> &Row {
        &self.rows[from.index()]
    }

    /// All rows in declaration order.
    pub fn rows(&self) -> &[Row; STATE_COUNT] {
        &self.rows
    }

    /// Probability of moving from `from` to `to`.
    pub fn get(&self, from: MarketState, to: MarketState) -> f64 {
        self.rows[from.index()][to.index()]
    }

    /// Checks every row.
    pub fn validate(&self) -> Result<(), InvalidMatrixError> {
        for from in MarketState::ALL {
            validate_row(from, self.row(from))?;
        }
        Ok(())
    }

    /// Returns the row for `from` rescaled to sum to exactly 1.
    ///
    /// Fails if the row is not a distribution within [`ROW_SUM_TOLERANCE`].
    pub fn normalized_row(&self, from: MarketState) -> Result<Row, InvalidMatrixError> {
        let row = self.row(from);
        let sum = validate_row(from, row)?;
        let mut normalized = *row;
        for p in normalized.iter_mut() {
            *p /= sum;
        }
        Ok(normalized)
    }

    /// Sum of absolute entry differences between two matrices.
    pub fn l1_distance(&self, other: &TransitionMatrix) -> f64 {
        self.rows
            .iter()
            .flatten()
            .zip(other.rows.iter().flatten())
            .map(|(a, b)| (a - b).abs())
            .sum()
    }

    /// Converts into the name-keyed serialized form.
    pub fn to_raw(&self) -> RawMatrix {
        MarketState::ALL
            .iter()
            .map(|from| {
                let row = MarketState::ALL
                    .iter()
                    .map(|to| (to.as_str().to_string(), self.get(*from, *to)))
                    .collect();
                (from.as_str().to_string(), row)
            })
            .collect()
    }
}

/// The calibration the market starts from when none is configured.
impl Default for TransitionMatrix {
    fn default() -> Self {
        // Columns: up, down, flat, boom, crash
        Self {
            rows: [
                [0.40, 0.30, 0.25, 0.025, 0.025],
                [0.30, 0.40, 0.25, 0.0, 0.05],
                [0.35, 0.30, 0.30, 0.025, 0.025],
                [0.30, 0.25, 0.40, 0.025, 0.025],
                [0.40, 0.30, 0.25, 0.025, 0.025],
            ],
        }
    }
}

impl TryFrom<RawMatrix> for TransitionMatrix {
    type Error = InvalidMatrixError;

    fn try_from(raw: RawMatrix) -> Result<Self, Self::Error> {
        let mut rows = [[0.0; STATE_COUNT]; STATE_COUNT];
        let mut seen = [false; STATE_COUNT];

        for (from_name, entries) in &raw {
            let from: MarketState = from_name.parse()?;
            seen[from.index()] = true;
            for (to_name, value) in entries {
                let to: MarketState = to_name.parse()?;
                rows[from.index()][to.index()] = *value;
            }
        }

        if let Some(missing) = MarketState::ALL.iter().find(|s| !seen[s.index()]) {
            return Err(InvalidMatrixError::MissingRow(*missing));
        }

        Self::from_rows(rows)
    }
}

impl From<TransitionMatrix> for RawMatrix {
    fn from(matrix: TransitionMatrix) -> Self {
        matrix.to_raw()
    }
}

/// Validates one row and returns its sum.
fn validate_row(from: MarketState, row: &Row) -> Result<f64, InvalidMatrixError> {
    for to in MarketState::ALL {
        let value = row[to.index()];
        if !(0.0..=1.0).contains(&value) {
            return Err(InvalidMatrixError::OutOfRange { from, to, value });
        }
    }
    let sum: f64 = row.iter().sum();
    if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
        return Err(InvalidMatrixError::RowSum { from, sum });
    }
    Ok(sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let matrix = TransitionMatrix::default();
        assert!(matrix.validate().is_ok());
        assert_eq!(matrix.get(MarketState::Down, MarketState::Boom), 0.0);
        assert_eq!(matrix.get(MarketState::Up, MarketState::Up), 0.40);
    }

    #[test]
    fn test_rejects_bad_row_sum() {
        let mut rows = *TransitionMatrix::uniform().rows();
        rows[MarketState::Flat.index()] = [0.5, 0.5, 0.5, 0.0, 0.0];
        let err = TransitionMatrix::from_rows(rows).unwrap_err();
        assert!(matches!(
            err,
            InvalidMatrixError::RowSum { from: MarketState::Flat, .. }
        ));
    }

    #[test]
    fn test_rejects_negative_and_nan() {
        let base = TransitionMatrix::uniform();
        let err = base
            .with_row(MarketState::Up, [1.2, -0.2, 0.0, 0.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, InvalidMatrixError::OutOfRange { to: MarketState::Up, .. }));

        let err = base
            .with_row(MarketState::Up, [f64::NAN, 1.0, 0.0, 0.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, InvalidMatrixError::OutOfRange { .. }));
    }

    #[test]
    fn test_tolerance_accepts_small_drift() {
        let base = TransitionMatrix::uniform();
        let matrix = base
            .with_row(MarketState::Boom, [0.5, 0.5 + 5e-7, 0.0, 0.0, 0.0])
            .unwrap();
        let row = matrix.normalized_row(MarketState::Boom).unwrap();
        let sum: f64 = row.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_absorbing() {
        let matrix = TransitionMatrix::absorbing(MarketState::Crash);
        for from in MarketState::ALL {
            assert_eq!(matrix.get(from, MarketState::Crash), 1.0);
        }
    }

    #[test]
    fn test_raw_round_trip_through_json() {
        let matrix = TransitionMatrix::default();
        let json = serde_json::to_string(&matrix).unwrap();
        let back: TransitionMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(matrix, back);
    }

    #[test]
    fn test_toml_with_sparse_rows() {
        let content = r#"
            [up]
            up = 0.5
            down = 0.3
            flat = 0.2

            [down]
            down = 1.0

            [flat]
            flat = 1.0

            [boom]
            boom = 1.0

            [crash]
            crash = 1.0
        "#;
        let matrix: TransitionMatrix = toml::from_str(content).unwrap();
        assert_eq!(matrix.get(MarketState::Up, MarketState::Flat), 0.2);
        assert_eq!(matrix.get(MarketState::Up, MarketState::Boom), 0.0);
    }

    #[test]
    fn test_missing_row_and_unknown_state() {
        let mut raw = TransitionMatrix::default().to_raw();
        raw.remove("crash");
        let err = TransitionMatrix::try_from(raw).unwrap_err();
        assert_eq!(err, InvalidMatrixError::MissingRow(MarketState::Crash));

        let mut raw = TransitionMatrix::default().to_raw();
        raw.insert("sideways".to_string(), BTreeMap::new());
        let err = TransitionMatrix::try_from(raw).unwrap_err();
        assert!(matches!(err, InvalidMatrixError::UnknownState(_)));
    }

    #[test]
    fn test_l1_distance() {
        let a = TransitionMatrix::absorbing(MarketState::Up);
        let b = TransitionMatrix::absorbing(MarketState::Down);
        assert!((a.l1_distance(&b) - 10.0).abs() < 1e-12);
        assert_eq!(a.l1_distance(&a), 0.0);
    }
}
