//! Participation Feedback
//!
//! Maps the change in investor participation to a perturbation of the
//! transition matrix for the next draw. Rising participation pushes every row
//! toward up/boom; falling participation pushes it toward down/crash.
//!
//! Each row is exponentially tilted, so a larger sensitivity always moves the
//! row further and never saturates:
//!
//! ```text
//! delta       = sensitivity * summary.change
//! tilted[s]   = base[s] * exp(delta * FEEDBACK_BIAS[s])
//! adjusted[s] = tilted[s] / sum(tilted)
//! ```
//!
//! When the low-participation penalty applies, its shift is added afterwards
//! and the row is clamped to [0, 1] and renormalized again. Zero entries of
//! the base matrix stay zero.
//!
//! The adjuster never draws random numbers; identical inputs give bit-identical
//! matrices.

use serde::{Deserialize, Serialize};

use market_events::{
    InvalidMatrixError, MarketState, ParticipationSummary, Row, TransitionMatrix, STATE_COUNT,
};

use crate::config::ConfigError;

/// Direction each target state moves per unit of participation change.
///
/// Columns follow [`MarketState::ALL`] (up, down, flat, boom, crash). `up` has
/// the largest weight and `down` the smallest, so they always move in the
/// direction of the change.
pub const FEEDBACK_BIAS: Row = [1.0, -1.0, 0.0, 0.5, -0.5];

/// Feedback tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Scale applied to the participation change
    pub sensitivity: f64,
    /// Confidence penalty when few investors remain
    pub low_participation: LowParticipationPenalty,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.5,
            low_participation: LowParticipationPenalty::default(),
        }
    }
}

impl FeedbackConfig {
    pub fn with_sensitivity(sensitivity: f64) -> Self {
        Self {
            sensitivity,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sensitivity.is_finite() || self.sensitivity < 0.0 {
            return Err(ConfigError::Sensitivity(self.sensitivity));
        }
        self.low_participation.validate()
    }
}

/// Level-based penalty applied while participation sits below a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowParticipationPenalty {
    pub enabled: bool,
    /// Participation fraction below which the penalty applies
    pub threshold: f64,
    /// Added to every row's `down` entry
    pub down_boost: f64,
    /// Removed from every row's `up` entry
    pub up_cut: f64,
    /// Removed from every row's `boom` entry
    pub boom_cut: f64,
}

impl Default for LowParticipationPenalty {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.5,
            down_boost: 0.05,
            up_cut: 0.03,
            boom_cut: 0.01,
        }
    }
}

impl LowParticipationPenalty {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// True when the penalty applies to `summary`.
    pub fn applies(&self, summary: &ParticipationSummary) -> bool {
        self.enabled && !summary.is_empty() && summary.fraction < self.threshold
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("feedback.low_participation.threshold", self.threshold),
            ("feedback.low_participation.down_boost", self.down_boost),
            ("feedback.low_participation.up_cut", self.up_cut),
            ("feedback.low_participation.boom_cut", self.boom_cut),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { field, value });
            }
        }
        Ok(())
    }
}

/// Produces the per-tick adjusted matrix from the base matrix.
#[derive(Debug, Clone, Default)]
pub struct FeedbackAdjuster {
    config: FeedbackConfig,
}

impl FeedbackAdjuster {
    pub fn new(config: FeedbackConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeedbackConfig {
        &self.config
    }

    /// Per-state exponent of the tilt, `sensitivity * change * FEEDBACK_BIAS`.
    pub fn tilt(&self, summary: &ParticipationSummary) -> Row {
        if summary.is_empty() {
            return [0.0; STATE_COUNT];
        }
        let delta = self.config.sensitivity * summary.change;
        FEEDBACK_BIAS.map(|bias| delta * bias)
    }

    /// Additive shift of the low-participation penalty, if it applies.
    pub fn penalty_shift(&self, summary: &ParticipationSummary) -> Option<Row> {
        let penalty = &self.config.low_participation;
        if !penalty.applies(summary) {
            return None;
        }
        let mut shift = [0.0; STATE_COUNT];
        shift[MarketState::Down.index()] = penalty.down_boost;
        shift[MarketState::Up.index()] = -penalty.up_cut;
        shift[MarketState::Boom.index()] = -penalty.boom_cut;
        Some(shift)
    }

    /// Returns a new matrix; `base` is left untouched.
    pub fn adjust(
        &self,
        base: &TransitionMatrix,
        summary: &ParticipationSummary,
    ) -> Result<TransitionMatrix, InvalidMatrixError> {
        let tilt = self.tilt(summary);
        let penalty = self.penalty_shift(summary);
        if tilt.iter().all(|e| *e == 0.0) && penalty.is_none() {
            return Ok(base.clone());
        }

        if penalty.is_some() {
            tracing::debug!(
                fraction = summary.fraction,
                threshold = self.config.low_participation.threshold,
                "low participation penalty engaged"
            );
        }

        let mut rows = *base.rows();
        for row in rows.iter_mut() {
            tilt_row(row, &tilt);
            if let Some(shift) = &penalty {
                shift_row(row, shift);
            }
        }
        TransitionMatrix::from_rows(rows)
    }
}

/// Multiplies each entry by `exp(exponent)` and rescales the row to sum to 1.
fn tilt_row(row: &mut Row, exponents: &Row) {
    // Offset by the largest live exponent so `exp` cannot overflow
    let peak = row
        .iter()
        .zip(exponents.iter())
        .filter(|(p, _)| **p > 0.0)
        .map(|(_, e)| *e)
        .fold(f64::NEG_INFINITY, f64::max);
    if !peak.is_finite() {
        return;
    }
    for (p, e) in row.iter_mut().zip(exponents.iter()) {
        *p *= (e - peak).exp();
    }
    normalize(row);
}

/// Applies `shift`, clamps to [0, 1] and rescales the row to sum to 1.
fn shift_row(row: &mut Row, shift: &Row) {
    for (p, s) in row.iter_mut().zip(shift.iter()) {
        *p = (*p + s).clamp(0.0, 1.0);
    }
    normalize(row);
}

fn normalize(row: &mut Row) {
    let total: f64 = row.iter().sum();
    if total > 0.0 {
        for p in row.iter_mut() {
            *p /= total;
        }
    }
}
