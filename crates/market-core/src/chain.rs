//! Market Chain
//!
//! Owns the current market state and advances it by sampling a row of the
//! matrix it is handed. The chain keeps no memory beyond the current state.

use rand::Rng;

use market_events::{InvalidMatrixError, MarketState, Row, TransitionMatrix};

#[derive(Debug, Clone)]
pub struct MarketChain {
    current: MarketState,
}

impl MarketChain {
    pub fn new(initial: MarketState) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> MarketState {
        self.current
    }

    /// Samples the next state from `matrix` using one draw from `rng`.
    ///
    /// The row is re-validated here even though matrices are validated on
    /// construction, since a fresh matrix arrives every tick.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        matrix: &TransitionMatrix,
        rng: &mut R,
    ) -> Result<MarketState, InvalidMatrixError> {
        let draw: f64 = rng.gen();
        self.advance_with_draw(matrix, draw)
    }

    /// Same as [`MarketChain::advance`] with the draw supplied by the caller.
    pub fn advance_with_draw(
        &mut self,
        matrix: &TransitionMatrix,
        draw: f64,
    ) -> Result<MarketState, InvalidMatrixError> {
        let row = matrix.normalized_row(self.current)?;
        let next = sample_next(&row, draw).ok_or(InvalidMatrixError::RowSum {
            from: self.current,
            sum: 0.0,
        })?;
        self.current = next;
        Ok(next)
    }
}

/// Picks the first state whose cumulative probability exceeds `draw`.
///
/// Zero-probability buckets are never selected. If rounding leaves `draw`
/// beyond the final cumulative sum, the last non-empty bucket wins. Returns
/// `None` only for a row without any mass.
pub fn sample_next(row: &Row, draw: f64) -> Option<MarketState> {
    let mut cumulative = 0.0;
    let mut last_nonempty = None;

    for state in MarketState::ALL {
        let p = row[state.index()];
        if p <= 0.0 {
            continue;
        }
        cumulative += p;
        last_nonempty = Some(state);
        if draw < cumulative {
            return Some(state);
        }
    }

    last_nonempty
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_sample_buckets() {
        // up 0.5, down 0.3, flat 0.2
        let row = [0.5, 0.3, 0.2, 0.0, 0.0];
        assert_eq!(sample_next(&row, 0.0), Some(MarketState::Up));
        assert_eq!(sample_next(&row, 0.49), Some(MarketState::Up));
        assert_eq!(sample_next(&row, 0.5), Some(MarketState::Down));
        assert_eq!(sample_next(&row, 0.79), Some(MarketState::Down));
        assert_eq!(sample_next(&row, 0.8), Some(MarketState::Flat));
        assert_eq!(sample_next(&row, 0.999_999), Some(MarketState::Flat));
    }

    #[test]
    fn test_zero_buckets_never_selected() {
        let row = [0.0, 0.0, 0.0, 0.0, 1.0];
        for draw in [0.0, 0.3, 0.999] {
            assert_eq!(sample_next(&row, draw), Some(MarketState::Crash));
        }
        assert_eq!(sample_next(&[0.0; 5], 0.5), None);
    }

    #[test]
    fn test_advance_updates_current() {
        let mut chain = MarketChain::new(MarketState::Flat);
        let matrix = TransitionMatrix::absorbing(MarketState::Boom);
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(chain.advance(&matrix, &mut rng).unwrap(), MarketState::Boom);
        assert_eq!(chain.current(), MarketState::Boom);
    }

    #[test]
    fn test_advance_uses_current_row() {
        let matrix = TransitionMatrix::absorbing(MarketState::Down)
            .with_row(MarketState::Up, [1.0, 0.0, 0.0, 0.0, 0.0])
            .unwrap();

        let mut from_up = MarketChain::new(MarketState::Up);
        assert_eq!(from_up.advance_with_draw(&matrix, 0.7).unwrap(), MarketState::Up);

        let mut from_flat = MarketChain::new(MarketState::Flat);
        assert_eq!(from_flat.advance_with_draw(&matrix, 0.7).unwrap(), MarketState::Down);
    }

    #[test]
    fn test_empirical_frequencies() {
        let matrix = TransitionMatrix::uniform()
            .with_row(MarketState::Flat, [0.7, 0.0, 0.3, 0.0, 0.0])
            .unwrap();
        let mut rng = SmallRng::seed_from_u64(99);
        let mut up = 0;
        for _ in 0..10_000 {
            let mut chain = MarketChain::new(MarketState::Flat);
            if chain.advance(&matrix, &mut rng).unwrap() == MarketState::Up {
                up += 1;
            }
        }
        let freq = up as f64 / 10_000.0;
        assert!((freq - 0.7).abs() < 0.03, "freq {}", freq);
    }
}
